use duet_client::CallState;

use crate::integration::init_tracing;
use crate::utils::{LoopbackHub, paired_peers, wait_for_state};

#[tokio::test]
async fn test_local_end_over_open_link() {
    init_tracing();
    let hub = LoopbackHub::new();
    hub.keep_departed_peers();
    let (p1, p2) = paired_peers(&hub, "abc").await.unwrap();
    let p1_id = p1.handle.local_id().clone();

    p1.handle.call().await.unwrap();
    wait_for_state(&p1.handle, CallState::Connected).await.unwrap();
    wait_for_state(&p2.handle, CallState::Connected).await.unwrap();

    p1.handle.end();
    p1.task.await.unwrap();

    // The relay still lists p1, so only call-ended can end p2.
    let ended = wait_for_state(&p2.handle, CallState::Ended).await.unwrap();
    assert!(ended.remote_stream.is_none());
    assert_eq!(hub.occupants("abc"), 2);
    assert_eq!(hub.sent_by(&p1_id, "end-call"), 1);
    p2.task.await.unwrap();
}
