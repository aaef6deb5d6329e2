use duet_client::CallState;

use crate::integration::init_tracing;
use crate::utils::{LoopbackHub, join_peer, wait_for_condition, wait_for_state, with_media};

#[tokio::test]
async fn test_peers_discover_each_other() {
    init_tracing();
    let hub = LoopbackHub::new();

    let p1 = join_peer(&hub, "abc", with_media()).await.unwrap();
    wait_for_condition(|| hub.occupants("abc") == 1)
        .await
        .expect("p1 never joined");
    assert_eq!(p1.handle.snapshot().state, CallState::Idle);

    let p2 = join_peer(&hub, "abc", with_media()).await.unwrap();

    let s1 = wait_for_state(&p1.handle, CallState::WaitingForRemote)
        .await
        .unwrap();
    let s2 = wait_for_state(&p2.handle, CallState::WaitingForRemote)
        .await
        .unwrap();

    assert_eq!(s1.remote_peer_id.as_ref(), Some(p2.handle.local_id()));
    assert_eq!(s2.remote_peer_id.as_ref(), Some(p1.handle.local_id()));
}
