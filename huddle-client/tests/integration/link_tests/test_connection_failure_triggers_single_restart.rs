use huddle_client::peer::{LinkHealth, LinkState};
use huddle_client::session::{SessionEvent, SessionStatus};
use huddle_core::ClientMessage;

use crate::integration::{connect_peer, create_test_session, host_room, init_tracing};
use crate::utils::{expect_outbound_silence, next_outbound, wait_for_event};

#[tokio::test]
async fn test_connection_failure_triggers_single_restart() {
    init_tracing();

    let mut session = create_test_session();
    let info = host_room(&mut session).await.expect("room entry failed");
    let peer_id = connect_peer(&mut session, &info.code, "peer-2", 2)
        .await
        .expect("peer never connected");
    assert_eq!(
        session.handle.status(),
        SessionStatus::Connected,
        "one connected link should report Connected"
    );

    // The native layer gives up; as the offerer we restart once.
    session
        .connector
        .fire_health(&peer_id, LinkHealth::Failed)
        .await;
    let restart = next_outbound(&mut session.outbound)
        .await
        .expect("no restart offer after failure");
    match restart {
        ClientMessage::Offer { target_id, sdp, .. } => {
            assert_eq!(target_id, peer_id, "restart offer must target the failed peer");
            assert!(
                sdp.contains("restart"),
                "restart negotiation should produce a restart offer, got {sdp:?}"
            );
        }
        other => panic!("expected a restart offer, got {other:?}"),
    }
    assert_eq!(
        session.connector.offers_for(&peer_id).await,
        vec![false, true],
        "exactly one restart offer on top of the original"
    );
    wait_for_event(&mut session.events, "restarting link", |event| {
        matches!(
            event,
            SessionEvent::LinkChanged { participant, state }
                if *participant == peer_id && *state == LinkState::Restarting
        )
    })
    .await
    .expect("link never entered Restarting");
    assert_eq!(
        session.handle.status(),
        SessionStatus::Connecting,
        "a restarting link reads as Connecting"
    );

    // Further failures while the restart is pending change nothing.
    session
        .connector
        .fire_health(&peer_id, LinkHealth::Failed)
        .await;
    session
        .connector
        .fire_health(&peer_id, LinkHealth::Failed)
        .await;
    expect_outbound_silence(&mut session.outbound)
        .await
        .expect("repeated failures must not stack restart offers");
    assert_eq!(
        session.connector.offers_for(&peer_id).await,
        vec![false, true],
        "restart fires once per failure transition"
    );

    // The restart lands and the link comes back.
    session
        .connector
        .fire_health(&peer_id, LinkHealth::Connected)
        .await;
    wait_for_event(&mut session.events, "recovered link", |event| {
        matches!(
            event,
            SessionEvent::LinkChanged { participant, state }
                if *participant == peer_id && *state == LinkState::Connected
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
