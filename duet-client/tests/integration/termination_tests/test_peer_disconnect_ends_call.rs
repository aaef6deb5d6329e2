use duet_client::CallState;

use crate::integration::init_tracing;
use crate::utils::{LoopbackHub, paired_peers, wait_for_state};

#[tokio::test]
async fn test_peer_disconnect_ends_call() {
    init_tracing();
    let hub = LoopbackHub::new();
    let (p1, p2) = paired_peers(&hub, "abc").await.unwrap();

    p1.handle.call().await.unwrap();
    wait_for_state(&p2.handle, CallState::Connected).await.unwrap();

    // Killing the task drops p1's link without an end-call.
    p1.task.abort();

    let ended = wait_for_state(&p2.handle, CallState::Ended).await.unwrap();
    assert!(ended.local_stream_id.is_none());
    assert!(ended.remote_stream.is_none());
}
