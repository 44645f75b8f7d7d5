//! Transport abstraction layer for Matchroom.
//!
//! The chat API (Telegram, a console bridge, a test double) sits behind the
//! [`Transport`] trait. The core never waits on it: deliveries are handed to
//! a background task which calls into the transport and logs failures.

mod error;
mod memory;

pub use error::TransportError;
pub use memory::MemoryTransport;

use std::future::Future;

use matchroom_protocol::{Delivery, Outbound, ParticipantId};

/// Sends messages and documents to participants.
///
/// The futures must be `Send` because every delivery runs in its own
/// spawned task.
pub trait Transport: Send + Sync + 'static {
    /// Sends a text message.
    fn send_text(
        &self,
        to: ParticipantId,
        text: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Sends a document with a caption.
    fn send_document(
        &self,
        to: ParticipantId,
        bytes: &[u8],
        filename: &str,
        caption: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Sends one [`Delivery`], picking the right method for its payload.
    fn deliver(
        &self,
        delivery: Delivery,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        async move {
            match delivery.message {
                Outbound::Text { text } => self.send_text(delivery.to, &text).await,
                Outbound::Document {
                    bytes,
                    filename,
                    caption,
                } => {
                    self.send_document(delivery.to, &bytes, &filename, &caption)
                        .await
                }
            }
        }
    }
}
