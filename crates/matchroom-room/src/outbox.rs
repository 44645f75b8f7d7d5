//! Where rooms put their outbound messages.
//!
//! Sending crosses the transport boundary and may be slow, so rooms never
//! send directly. They post to an [`Outbox`], which only queues; the
//! server drains the queue in a separate task. Posting to one recipient
//! failing must not stop the others, so [`dispatch`] attempts every
//! recipient and reports the failures.

use matchroom_protocol::{Delivery, Outbound, ParticipantId, RoomId};
use tokio::sync::mpsc;

use crate::DeliveryError;

/// A non-blocking sink for outbound messages.
pub trait Outbox: Send + Sync {
    /// Queues `message` for `to`. Must not block.
    fn post(&self, to: ParticipantId, message: Outbound) -> Result<(), DeliveryError>;
}

/// The server's delivery queue.
impl Outbox for mpsc::UnboundedSender<Delivery> {
    fn post(&self, to: ParticipantId, message: Outbound) -> Result<(), DeliveryError> {
        self.send(Delivery { to, message })
            .map_err(|_| DeliveryError::Closed)
    }
}

/// Outcome of posting one message to several recipients.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: Vec<(ParticipantId, DeliveryError)>,
}

impl DispatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Posts `message` to every recipient, collecting failures instead of
/// stopping at the first one. Failures are logged once per call.
pub fn dispatch(
    outbox: &dyn Outbox,
    room_id: Option<RoomId>,
    recipients: impl IntoIterator<Item = ParticipantId>,
    message: &Outbound,
) -> DispatchReport {
    let mut report = DispatchReport::default();
    for to in recipients {
        match outbox.post(to, message.clone()) {
            Ok(()) => report.delivered += 1,
            Err(e) => report.failed.push((to, e)),
        }
    }
    if !report.is_complete() {
        let failed: Vec<String> = report.failed.iter().map(|(p, _)| p.to_string()).collect();
        tracing::warn!(
            room_id = ?room_id,
            delivered = report.delivered,
            failed = ?failed,
            "some notifications could not be queued"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct Picky {
        refuse: HashSet<ParticipantId>,
    }

    impl Outbox for Picky {
        fn post(&self, to: ParticipantId, _message: Outbound) -> Result<(), DeliveryError> {
            if self.refuse.contains(&to) {
                Err(DeliveryError::Rejected(to))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_dispatch_attempts_every_recipient() {
        let outbox = Picky {
            refuse: [ParticipantId(2)].into_iter().collect(),
        };
        let report = dispatch(
            &outbox,
            None,
            [ParticipantId(1), ParticipantId(2), ParticipantId(3)],
            &Outbound::text("hi"),
        );
        assert_eq!(report.delivered, 2);
        assert_eq!(
            report.failed,
            vec![(ParticipantId(2), DeliveryError::Rejected(ParticipantId(2)))]
        );
    }

    #[test]
    fn test_channel_outbox_reports_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel::<Delivery>();
        drop(rx);
        assert_eq!(
            tx.post(ParticipantId(1), Outbound::text("x")),
            Err(DeliveryError::Closed)
        );
    }

    #[test]
    fn test_channel_outbox_queues_delivery() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Delivery>();
        tx.post(ParticipantId(4), Outbound::text("hello")).unwrap();
        let delivery = rx.try_recv().unwrap();
        assert_eq!(delivery.to, ParticipantId(4));
        assert_eq!(delivery.message, Outbound::text("hello"));
    }
}
