use huddle_client::peer::{LinkHealth, LinkState};
use huddle_client::session::{SessionEvent, SessionStatus};
use huddle_core::{ClientMessage, ServerMessage};

use crate::integration::{
    answer_host_offer, create_test_session, init_tracing, join_room,
};
use crate::utils::{expect_outbound_silence, next_outbound, wait_for_event, LinkOp, TEST_ROOM};

#[tokio::test]
async fn test_answerer_parks_until_restart_offer() {
    init_tracing();

    let mut session = create_test_session();
    let info = join_room(&mut session, TEST_ROOM)
        .await
        .expect("room entry failed");
    let host = answer_host_offer(&mut session, &info.code, "host-1")
        .await
        .expect("no answer for the host offer");
    session
        .connector
        .fire_health(&host, LinkHealth::Connected)
        .await;
    wait_for_event(&mut session.events, "connected link", |event| {
        matches!(
            event,
            SessionEvent::LinkChanged { participant, state }
                if *participant == host && *state == LinkState::Connected
        )
    })
    .await
    .expect("link never connected");

    // As the answerer we park and wait for the host to restart.
    session
        .connector
        .fire_health(&host, LinkHealth::Failed)
        .await;
    wait_for_event(&mut session.events, "restarting link", |event| {
        matches!(
            event,
            SessionEvent::LinkChanged { participant, state }
                if *participant == host && *state == LinkState::Restarting
        )
    })
    .await
    .expect("link never entered Restarting");
    expect_outbound_silence(&mut session.outbound)
        .await
        .expect("an answerer must not send restart offers");
    assert_eq!(
        session.connector.offers_for(&host).await,
        Vec::<bool>::new(),
        "the answerer side never creates offers"
    );

    // The host's restart offer arrives and we answer again.
    session.push(ServerMessage::Offer {
        room_id: info.code.clone(),
        sender_id: host.clone(),
        sdp: "v=0 restart-offer host-1".to_string(),
    });
    let reply = next_outbound(&mut session.outbound)
        .await
        .expect("no answer for the restart offer");
    match reply {
        ClientMessage::Answer { target_id, .. } => {
            assert_eq!(target_id, host, "the answer must target the host");
        }
        other => panic!("expected an answer, got {other:?}"),
    }
    let ops = session.connector.ops_for(&host).await;
    let attaches = ops
        .iter()
        .filter(|op| matches!(op, LinkOp::Attach { .. }))
        .count();
    let accepts = ops
        .iter()
        .filter(|op| matches!(op, LinkOp::AcceptOffer { .. }))
        .count();
    assert_eq!(attaches, 1, "tracks attach once, not per renegotiation");
    assert_eq!(accepts, 2, "the restart offer goes through the existing link");

    session
        .connector
        .fire_health(&host, LinkHealth::Connected)
        .await;
    wait_for_event(&mut session.events, "recovered link", |event| {
        matches!(
            event,
            SessionEvent::LinkChanged { participant, state }
                if *participant == host && *state == LinkState::Connected
        )
    })
    .await
    .expect("link never recovered");
    assert_eq!(
        session.handle.status(),
        SessionStatus::Connected,
        "a successful restart should restore Connected"
    );
}
