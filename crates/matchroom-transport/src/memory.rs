//! An in-memory [`Transport`] that records every delivery.
//!
//! Used by the integration tests and handy when wiring a new front end:
//! it can be told to reject messages for chosen participants to exercise
//! the failure paths.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use matchroom_protocol::{Delivery, Outbound, ParticipantId};

use crate::{Transport, TransportError};

#[derive(Debug, Default)]
struct Inner {
    sent: Vec<Delivery>,
    failing: HashSet<ParticipantId>,
}

/// Records deliveries instead of sending them. Cheap to clone; clones
/// share the same record.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryTransport {
    /// Creates an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every future send to `participant` fail with
    /// [`TransportError::Rejected`].
    pub fn fail_for(&self, participant: ParticipantId) {
        self.lock().failing.insert(participant);
    }

    /// All successful deliveries so far, in completion order.
    pub fn sent(&self) -> Vec<Delivery> {
        self.lock().sent.clone()
    }

    /// Text messages delivered to one participant.
    pub fn texts_for(&self, participant: ParticipantId) -> Vec<String> {
        self.lock()
            .sent
            .iter()
            .filter(|d| d.to == participant)
            .filter_map(|d| match &d.message {
                Outbound::Text { text } => Some(text.clone()),
                Outbound::Document { .. } => None,
            })
            .collect()
    }

    /// Documents delivered to one participant, as `(filename, bytes)`.
    pub fn documents_for(&self, participant: ParticipantId) -> Vec<(String, Vec<u8>)> {
        self.lock()
            .sent
            .iter()
            .filter(|d| d.to == participant)
            .filter_map(|d| match &d.message {
                Outbound::Document {
                    bytes, filename, ..
                } => Some((filename.clone(), bytes.clone())),
                Outbound::Text { .. } => None,
            })
            .collect()
    }

    fn record(&self, to: ParticipantId, message: Outbound) -> Result<(), TransportError> {
        let mut inner = self.lock();
        if inner.failing.contains(&to) {
            return Err(TransportError::Rejected {
                to,
                reason: "participant unreachable".into(),
            });
        }
        inner.sent.push(Delivery { to, message });
        Ok(())
    }
}

impl Transport for MemoryTransport {
    async fn send_text(&self, to: ParticipantId, text: &str) -> Result<(), TransportError> {
        self.record(to, Outbound::text(text))
    }

    async fn send_document(
        &self,
        to: ParticipantId,
        bytes: &[u8],
        filename: &str,
        caption: &str,
    ) -> Result<(), TransportError> {
        self.record(
            to,
            Outbound::Document {
                bytes: bytes.to_vec(),
                filename: filename.to_string(),
                caption: caption.to_string(),
            },
        )
    }
}
