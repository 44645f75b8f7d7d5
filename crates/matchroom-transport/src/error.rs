use matchroom_protocol::ParticipantId;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The chat API refused the message (blocked bot, deleted chat, ...).
    #[error("delivery to {to} rejected: {reason}")]
    Rejected { to: ParticipantId, reason: String },

    /// Writing to the underlying stream failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// The transport was shut down.
    #[error("transport shut down")]
    Shutdown,
}
