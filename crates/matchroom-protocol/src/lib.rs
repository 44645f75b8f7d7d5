//! Wire-level vocabulary for Matchroom.
//!
//! This crate defines what flows across the boundary between the chat
//! transport and the matchmaking core:
//!
//! - **Types** ([`ParticipantId`], [`RoomId`], [`Category`], [`Inbound`],
//!   [`Outbound`], [`Delivery`]): identities and the events that carry
//!   participant text in and notifications out.
//! - **Commands** ([`Command`]): the slash-command surface parsed from
//!   inbound text.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events are turned
//!   into bytes for a bridge process.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (chat API) → Protocol (Inbound / Command) → Director (rooms, pool)
//! ```
//!
//! The protocol layer knows nothing about rooms or registries; it only
//! names things and converts them.

mod codec;
mod command;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use command::Command;
pub use error::ProtocolError;
pub use types::{
    Category, Delivery, DocumentRef, Inbound, InboundBody, Outbound,
    ParticipantId, RoomId,
};
