//! Error types for the protocol layer.
//!
//! Each Matchroom crate defines its own error enum, so a `ProtocolError`
//! always means "the bytes or the text were malformed", never a room or
//! registry problem.

/// Errors that can occur while decoding events or parsing commands.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A category token other than `a` or `b`.
    #[error("unknown category {0:?}, expected \"a\" or \"b\"")]
    UnknownCategory(String),

    /// A participant or room identifier that doesn't parse.
    #[error("invalid identifier {0:?}")]
    InvalidId(String),

    /// A slash command nobody handles.
    #[error("unknown command /{0}")]
    UnknownCommand(String),

    /// A known command with missing or malformed arguments.
    /// Carries the usage line to show back to the sender.
    #[error("usage: {0}")]
    Usage(&'static str),
}
