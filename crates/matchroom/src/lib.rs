//! # Matchroom
//!
//! Chat-driven matchmaking rooms.
//!
//! Participants register with one of two categories and wait in a pool.
//! An administrator triggers a round; every room seats one focal
//! participant and a fixed number of candidates from the other category,
//! runs a turn-based question/answer rotation, and ends with the focal
//! participant picking a candidate. Afterwards everyone returns to the
//! pool and the transcript goes to the operator.
//!
//! The chat API sits behind [`Transport`](matchroom_transport::Transport)
//! and user storage behind [`Registry`](matchroom_registry::Registry).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use matchroom::prelude::*;
//!
//! # async fn demo() -> Result<(), MatchroomError> {
//! let server = MatchroomServerBuilder::new()
//!     .config(AppConfig::default())
//!     .build(MemoryTransport::new());
//! let handle = server.handle();
//! tokio::spawn(server.run());
//!
//! handle.submit(Inbound::text(ParticipantId(1), "/register a Ada")).await?;
//! println!("{}", handle.lobby().await?);
//! handle.shutdown().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{AppConfig, ConfigError, DEFAULT_COMMAND_CHANNEL_SIZE};
pub use error::MatchroomError;
pub use handler::{MESSAGE_CHUNK_LIMIT, chunk_lines};
pub use server::{MatchroomServer, MatchroomServerBuilder, ServerCommand, ServerHandle};

pub use matchroom_protocol as protocol;
pub use matchroom_registry as registry;
pub use matchroom_room as room;
pub use matchroom_transport as transport;

/// Installs a `tracing` subscriber that logs to stderr.
///
/// `RUST_LOG` wins over `default_filter`. Calling this twice is harmless.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// The types most applications need.
pub mod prelude {
    pub use crate::{
        AppConfig, MatchroomError, MatchroomServer, MatchroomServerBuilder, ServerHandle,
        init_tracing,
    };
    pub use matchroom_protocol::{
        Category, Codec, Command, Delivery, Inbound, InboundBody, JsonCodec, Outbound,
        ParticipantId, RoomId,
    };
    pub use matchroom_registry::{MemoryRegistry, Registry, UserRecord};
    pub use matchroom_room::{FinishedRoom, LobbyStatus, RoomConfig, RoomState};
    pub use matchroom_transport::{MemoryTransport, Transport, TransportError};
}
