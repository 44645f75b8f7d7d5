//! Integration tests for the in-memory transport through the `Transport` trait.

use matchroom_protocol::{Delivery, Outbound, ParticipantId};
use matchroom_transport::{MemoryTransport, Transport, TransportError};

#[tokio::test]
async fn test_deliver_text_is_recorded() {
    let transport = MemoryTransport::new();
    transport
        .deliver(Delivery {
            to: ParticipantId(1),
            message: Outbound::text("hello"),
        })
        .await
        .expect("delivery should succeed");

    assert_eq!(transport.texts_for(ParticipantId(1)), vec!["hello".to_string()]);
    assert!(transport.texts_for(ParticipantId(2)).is_empty());
}

#[tokio::test]
async fn test_deliver_document_routes_to_send_document() {
    let transport = MemoryTransport::new();
    transport
        .deliver(Delivery {
            to: ParticipantId(9),
            message: Outbound::Document {
                bytes: b"Room: R-1".to_vec(),
                filename: "room_R-1.txt".into(),
                caption: "transcript".into(),
            },
        })
        .await
        .unwrap();

    let docs = transport.documents_for(ParticipantId(9));
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].0, "room_R-1.txt");
    assert_eq!(docs[0].1, b"Room: R-1".to_vec());
}

#[tokio::test]
async fn test_rejected_participant_returns_error() {
    let transport = MemoryTransport::new();
    transport.fail_for(ParticipantId(4));

    let err = transport
        .send_text(ParticipantId(4), "are you there?")
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Rejected { to, .. } if to == ParticipantId(4)));

    // Other participants are unaffected.
    transport.send_text(ParticipantId(5), "hi").await.unwrap();
    assert_eq!(transport.sent().len(), 1);
}
