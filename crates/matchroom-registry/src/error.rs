//! Error types for the registry layer.

use matchroom_protocol::ParticipantId;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No record exists for the given participant.
    #[error("participant {0} is not registered")]
    NotFound(ParticipantId),

    /// The participant already has a record. Registration is one-shot.
    #[error("participant {0} is already registered")]
    AlreadyRegistered(ParticipantId),
}
