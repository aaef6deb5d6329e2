use duet_client::CallState;

use crate::integration::init_tracing;
use crate::utils::{LoopbackHub, paired_peers, wait_for_condition, wait_for_state};

#[tokio::test]
async fn test_dropping_handles_ends_call() {
    init_tracing();
    let hub = LoopbackHub::new();
    let (p1, p2) = paired_peers(&hub, "abc").await.unwrap();
    let p1_id = p1.handle.local_id().clone();

    p1.handle.call().await.unwrap();
    wait_for_state(&p2.handle, CallState::Connected).await.unwrap();

    let task = p1.task;
    drop(p1.handle);
    task.await.unwrap();

    wait_for_condition(|| hub.sent_by(&p1_id, "end-call") == 1)
        .await
        .unwrap();
    wait_for_state(&p2.handle, CallState::Ended).await.unwrap();
}
