use huddle_client::media::MediaKind;

use crate::integration::{create_test_session, host_room, init_tracing};

#[tokio::test]
async fn test_toggle_flips_local_track() {
    init_tracing();

    let mut session = create_test_session();
    host_room(&mut session).await.expect("room entry failed");
    let audio = session
        .media
        .acquired()
        .into_iter()
        .find(|handle| handle.kind == MediaKind::Audio)
        .expect("no audio track was acquired");

    let state = session
        .handle
        .toggle(MediaKind::Audio)
        .await
        .expect("toggle failed");
    assert!(!state, "a fresh track starts enabled, so the flip mutes");

    let state = session
        .handle
        .toggle(MediaKind::Audio)
        .await
        .expect("toggle failed");
    assert!(state, "the second flip unmutes");

    assert_eq!(
        session.media.switched(),
        vec![(audio, false), (audio, true)],
        "every flip should reach the capture backend"
    );
}
