//! Unified error type for Matchroom.

use matchroom_protocol::ProtocolError;
use matchroom_registry::RegistryError;
use matchroom_room::RoomError;
use matchroom_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum MatchroomError {
    /// Sending to the chat API failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Bad command, id, or encoded event.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// User storage lookup or update failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Pool, allocation, or room state error.
    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The server task stopped.
    #[error("server is shut down")]
    Shutdown,
}
