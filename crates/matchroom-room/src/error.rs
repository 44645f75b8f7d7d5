//! Error types for the room layer.

use matchroom_protocol::{ParticipantId, RoomId};

/// Errors that can occur during pool, allocation, and room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (never created, or already torn down).
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The participant is not waiting in the pool.
    #[error("participant {0} is not in the waiting pool")]
    NotInPool(ParticipantId),

    /// The participant already sits in a room.
    #[error("participant {0} is already in room {1}")]
    AlreadyInRoom(ParticipantId, RoomId),

    /// The room is in a state that doesn't allow this operation.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// The pool can't fill a single room.
    #[error("insufficient participants, need ratio {ratio}:1 or 1:{ratio}")]
    InsufficientParticipants { ratio: usize },

    /// The focal participant picked a candidate that doesn't exist.
    #[error("invalid selection {choice}, pick a candidate between 1 and {max}")]
    InvalidSelection { choice: usize, max: usize },

    /// The prompt book is empty.
    #[error("no prompts configured")]
    NoPrompts,

    /// A room without candidates can't vote.
    #[error("room {0} has no candidates")]
    NoCandidates(RoomId),
}

/// A single outbound message could not be queued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The delivery task is gone (server shutting down).
    #[error("delivery channel closed")]
    Closed,

    /// The outbox refused this recipient.
    #[error("recipient {0} rejected")]
    Rejected(ParticipantId),
}
