//! Codec trait and implementations for serializing/deserializing events.
//!
//! A bridge process between the chat API and the Director exchanges
//! [`Inbound`](crate::Inbound) and [`Delivery`](crate::Delivery) values as
//! bytes. The core doesn't care which format is used, only that something
//! implements [`Codec`].

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// `Send + Sync + 'static` so one codec can live inside long-running
/// Tokio tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// One value per line works well for stdin/stdout bridges: JSON never
/// contains a raw newline outside of strings.
///
/// ## Example
///
/// ```rust
/// use matchroom_protocol::{Codec, Inbound, JsonCodec, ParticipantId};
///
/// let codec = JsonCodec;
/// let event = Inbound::text(ParticipantId(7), "/lobby");
///
/// let bytes = codec.encode(&event).unwrap();
/// let decoded: Inbound = codec.decode(&bytes).unwrap();
/// assert_eq!(event, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Delivery, Inbound, Outbound, ParticipantId};

    #[test]
    fn test_decode_garbage_returns_error() {
        let result: Result<Inbound, _> = JsonCodec.decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_wrong_shape_returns_error() {
        let result: Result<Inbound, _> = JsonCodec.decode(br#"{"from":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_delivery_encodes_as_single_line() {
        let delivery = Delivery {
            to: ParticipantId(3),
            message: Outbound::text("line one\nline two"),
        };
        let bytes = JsonCodec.encode(&delivery).unwrap();
        assert!(!bytes.contains(&b'\n'));
    }
}
