use huddle_core::{ParticipantId, ServerMessage};

use crate::integration::{create_test_session, host_room, init_tracing};
use crate::utils::{candidate, next_outbound, peer, summary};

#[tokio::test]
async fn test_candidate_from_unknown_participant_is_dropped() {
    init_tracing();

    let mut session = create_test_session();
    let info = host_room(&mut session).await.expect("room entry failed");

    let ghost = ParticipantId::from("ghost-9");
    session.push(ServerMessage::IceCandidate {
        room_id: info.code.clone(),
        sender_id: ghost.clone(),
        candidate: candidate(1),
    });
    // A join on the same stream fences the candidate above.
    session.push(ServerMessage::ParticipantJoined {
        room_id: info.code.clone(),
        participant: summary("peer-2"),
        participant_count: 2,
    });
    next_outbound(&mut session.outbound)
        .await
        .expect("no offer for the newcomer");

    assert_eq!(
        session.connector.opens_for(&ghost).await,
        0,
        "a stray candidate must not conjure a peer link"
    );
    assert!(
        session.connector.candidates_for(&ghost).await.is_empty(),
        "the stray candidate should be dropped"
    );
    assert!(
        session
            .connector
            .candidates_for(&peer("peer-2"))
            .await
            .is_empty(),
        "the stray candidate must not leak onto another link"
    );
}
