use duet_client::CallState;

use crate::integration::init_tracing;
use crate::utils::{LoopbackHub, join_peer, paired_peers, wait_for_state, without_media};

#[tokio::test]
async fn test_third_peer_is_rejected() {
    init_tracing();
    let hub = LoopbackHub::new();
    let (p1, p2) = paired_peers(&hub, "abc").await.unwrap();

    let p3 = join_peer(&hub, "abc", without_media()).await.unwrap();

    wait_for_state(&p3.handle, CallState::Ended)
        .await
        .expect("third peer should be turned away");
    p3.task.await.unwrap();

    assert_eq!(hub.occupants("abc"), 2);
    assert_eq!(p1.handle.snapshot().state, CallState::WaitingForRemote);
    assert_eq!(p2.handle.snapshot().state, CallState::WaitingForRemote);
}
