//! Waiting pool, room allocation and room lifecycle for Matchroom.
//!
//! Participants wait in a [`WaitingPool`] until an administrator triggers a
//! round. The [`allocator`] turns the pool into rooms of one focal
//! participant and `N` candidates of the other category; each [`Room`]
//! then runs its question/answer rotation and final vote. The
//! [`Director`] ties it together: it owns the pool, the rooms and the
//! identity→room index, and routes every inbound event.
//!
//! # Key types
//!
//! - [`Director`]: routes events, triggers rounds, tears rooms down
//! - [`Room`]: one room's state machine
//! - [`RoomState`]: lifecycle state machine
//! - [`RoomConfig`]: room settings (candidates per room, prompt limit, seed)
//! - [`Outbox`]: where rooms post outbound messages

pub mod allocator;
mod config;
mod director;
mod error;
mod outbox;
mod pool;
mod prompts;
mod room;
mod transcript;

pub use allocator::{Member, RoomSpec, RoundPlan};
pub use config::{RoomConfig, RoomState};
pub use director::{AnonymousDirectory, Director, Directory, LobbyStatus};
pub use error::{DeliveryError, RoomError};
pub use outbox::{DispatchReport, Outbox, dispatch};
pub use pool::WaitingPool;
pub use prompts::PromptBook;
pub use room::{FinishedRoom, ResponseOutcome, Room, Seat, VoteOutcome};
pub use transcript::{Entry, Role, SEPARATOR, Transcript, TranscriptHeader};
