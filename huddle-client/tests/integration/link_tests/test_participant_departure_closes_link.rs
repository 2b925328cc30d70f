use huddle_client::session::{SessionEvent, SessionStatus};
use huddle_core::ServerMessage;

use crate::integration::{connect_peer, create_test_session, host_room, init_tracing};
use crate::utils::{summary, wait_for_event};

#[tokio::test]
async fn test_participant_departure_closes_link() {
    init_tracing();

    let mut session = create_test_session();
    let info = host_room(&mut session).await.expect("room entry failed");
    let peer_id = connect_peer(&mut session, &info.code, "peer-2", 2)
        .await
        .expect("peer never connected");

    session.push(ServerMessage::ParticipantLeft {
        room_id: info.code.clone(),
        participant: summary("peer-2"),
        participant_count: 1,
    });
    let event = wait_for_event(&mut session.events, "the departure", |event| {
        matches!(
            event,
            SessionEvent::ParticipantLeft { participant, .. } if *participant == peer_id
        )
    })
    .await
    .expect("departure never surfaced");
    match event {
        SessionEvent::ParticipantLeft {
            participant_count, ..
        } => assert_eq!(participant_count, 1, "the event carries the relay's count"),
        other => panic!("expected a departure, got {other:?}"),
    }
    assert_eq!(
        session.connector.closes_for(&peer_id).await,
        1,
        "the departed peer's connection should be closed"
    );
    let roster = session.handle.roster();
    assert!(roster.is_empty(), "a departed participant must be dropped");
    assert_eq!(
        session.handle.status(),
        SessionStatus::Disconnected,
        "nobody left means Disconnected"
    );

    // A duplicate departure notice is harmless; closing is idempotent.
    session.push(ServerMessage::ParticipantLeft {
        room_id: info.code.clone(),
        participant: summary("peer-2"),
        participant_count: 1,
    });
    wait_for_event(&mut session.events, "the duplicate departure", |event| {
        matches!(
            event,
            SessionEvent::ParticipantLeft { participant, .. } if *participant == peer_id
        )
    })
    .await
    .expect("duplicate departure never surfaced");
    assert_eq!(
        session.connector.closes_for(&peer_id).await,
        1,
        "a duplicate departure must not close twice"
    );
}
