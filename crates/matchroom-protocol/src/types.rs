//! Core protocol types for Matchroom.
//!
//! Everything in this module crosses the transport boundary: inbound
//! events arrive from the chat API, outbound deliveries leave towards it.
//! All of them are plain data with serde support so a bridge process can
//! ship them as JSON lines.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a participant (a chat user).
///
/// Newtype wrapper around the transport's numeric user id, so a
/// `RoomId` can never be passed where a participant is expected.
///
/// `#[serde(transparent)]` keeps the JSON form a plain number:
/// `ParticipantId(42)` ↔ `42`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Accepts both the raw number (`"42"`) and the display form (`"P-42"`).
impl FromStr for ParticipantId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(s, 'P').map(ParticipantId)
    }
}

/// A unique identifier for a room (one matchmaking session).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// Accepts both the raw number (`"3"`) and the display form (`"R-3"`).
impl FromStr for RoomId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(s, 'R').map(RoomId)
    }
}

fn parse_prefixed(s: &str, prefix: char) -> Result<u64, ProtocolError> {
    let trimmed = s.trim();
    let digits = match trimmed.split_once('-') {
        Some((head, tail)) if head.eq_ignore_ascii_case(&prefix.to_string()) => tail,
        _ => trimmed,
    };
    digits
        .parse()
        .map_err(|_| ProtocolError::InvalidId(trimmed.to_string()))
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// The binary attribute every participant carries.
///
/// A room always pairs one focal participant of one category with
/// candidates of the other category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    A,
    B,
}

impl Category {
    /// The opposite category.
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

impl FromStr for Category {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(Self::A),
            "b" => Ok(Self::B),
            other => Err(ProtocolError::UnknownCategory(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound: what the transport hands us
// ---------------------------------------------------------------------------

/// A reference to a document the transport received.
///
/// The bytes stay with the transport; the core only needs to know that
/// a document arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Transport-specific handle used to download the file.
    pub file_id: String,
    /// Original file name, when the sender provided one.
    #[serde(default)]
    pub file_name: Option<String>,
}

/// The content of an inbound event.
///
/// Adjacently tagged so the JSON reads
/// `{ "type": "Text", "data": "/lobby" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InboundBody {
    Text(String),
    Document(DocumentRef),
}

/// One event from one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inbound {
    /// Who sent it.
    pub from: ParticipantId,

    /// The sender's display name as reported by the transport. Used as
    /// the default registration name.
    #[serde(default)]
    pub name: Option<String>,

    pub body: InboundBody,
}

impl Inbound {
    /// Shorthand for a text event without a display name.
    pub fn text(from: ParticipantId, text: impl Into<String>) -> Self {
        Self {
            from,
            name: None,
            body: InboundBody::Text(text.into()),
        }
    }

    /// Returns the text content, if this is a text event.
    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            InboundBody::Text(text) => Some(text),
            InboundBody::Document(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound: what we ask the transport to send
// ---------------------------------------------------------------------------

/// A message for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Outbound {
    /// Plain text message.
    Text { text: String },

    /// A file with a caption (finished transcripts).
    Document {
        bytes: Vec<u8>,
        filename: String,
        caption: String,
    },
}

impl Outbound {
    /// Shorthand for [`Outbound::Text`].
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// An outbound message paired with its recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub to: ParticipantId,
    pub message: Outbound,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&ParticipantId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_participant_id_display() {
        assert_eq!(ParticipantId(7).to_string(), "P-7");
    }

    #[test]
    fn test_participant_id_parses_raw_and_prefixed() {
        assert_eq!("42".parse::<ParticipantId>().unwrap(), ParticipantId(42));
        assert_eq!("P-42".parse::<ParticipantId>().unwrap(), ParticipantId(42));
        assert_eq!("p-9".parse::<ParticipantId>().unwrap(), ParticipantId(9));
        assert!("P-x".parse::<ParticipantId>().is_err());
        assert!("R-4".parse::<ParticipantId>().is_err());
    }

    #[test]
    fn test_room_id_display_and_parse() {
        assert_eq!(RoomId(3).to_string(), "R-3");
        assert_eq!("R-3".parse::<RoomId>().unwrap(), RoomId(3));
        assert_eq!(" 12 ".parse::<RoomId>().unwrap(), RoomId(12));
        assert!("room".parse::<RoomId>().is_err());
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("a".parse::<Category>().unwrap(), Category::A);
        assert_eq!("B".parse::<Category>().unwrap(), Category::B);
        let err = "c".parse::<Category>().unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownCategory(ref t) if t == "c"));
    }

    #[test]
    fn test_category_other() {
        assert_eq!(Category::A.other(), Category::B);
        assert_eq!(Category::B.other(), Category::A);
    }

    #[test]
    fn test_category_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Category::A).unwrap(), "\"a\"");
    }

    #[test]
    fn test_inbound_text_json_shape() {
        let event = Inbound::text(ParticipantId(5), "/lobby");
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["from"], 5);
        assert_eq!(json["body"]["type"], "Text");
        assert_eq!(json["body"]["data"], "/lobby");
    }

    #[test]
    fn test_inbound_name_defaults_when_missing() {
        let json = r#"{"from":1,"body":{"type":"Text","data":"hi"}}"#;
        let event: Inbound = serde_json::from_str(json).unwrap();
        assert_eq!(event.name, None);
        assert_eq!(event.as_text(), Some("hi"));
    }

    #[test]
    fn test_inbound_document_has_no_text() {
        let event = Inbound {
            from: ParticipantId(1),
            name: None,
            body: InboundBody::Document(DocumentRef {
                file_id: "f1".into(),
                file_name: None,
            }),
        };
        assert_eq!(event.as_text(), None);
    }
}
