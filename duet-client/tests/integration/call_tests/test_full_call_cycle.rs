use duet_client::{CallState, LocalTrack, TrackKind};

use crate::integration::init_tracing;
use crate::utils::{LoopbackHub, paired_peers, wait_for_condition, wait_for_state, wait_until};

#[tokio::test]
async fn test_full_call_cycle() {
    init_tracing();
    let hub = LoopbackHub::new();
    let (p1, p2) = paired_peers(&hub, "abc").await.unwrap();
    let p1_id = p1.handle.local_id().clone();
    let p2_id = p2.handle.local_id().clone();

    p1.handle.call().await.expect("call failed");

    wait_for_state(&p1.handle, CallState::Connected).await.unwrap();
    wait_for_state(&p2.handle, CallState::Connected).await.unwrap();
    let s2 = wait_until(&p2.handle, |s| s.remote_stream.is_some())
        .await
        .unwrap();
    assert_eq!(s2.remote_stream.unwrap().tracks.len(), 2);

    let stream_id = p1.handle.snapshot().local_stream_id.unwrap();
    let screen = LocalTrack::new(TrackKind::Video, "screen", stream_id);
    p1.handle.attach_track(screen).await.unwrap();

    wait_for_condition(|| hub.sent_by(&p2_id, "peer:nego:final") == 1)
        .await
        .expect("renegotiation never answered");
    wait_for_state(&p1.handle, CallState::Connected).await.unwrap();
    wait_until(&p2.handle, |s| {
        s.remote_stream.as_ref().is_some_and(|r| r.tracks.len() == 3)
    })
    .await
    .expect("new track never reached p2");

    assert_eq!(hub.sent_by(&p1_id, "call-user"), 1);
    assert_eq!(hub.sent_by(&p1_id, "peer:nego:needed"), 1);
    assert_eq!(hub.sent_by(&p2_id, "call-accepted"), 1);
    assert_eq!(hub.sent_by(&p2_id, "peer:nego:needed"), 0);

    p1.handle.end();
    wait_for_state(&p1.handle, CallState::Ended).await.unwrap();
    wait_for_state(&p2.handle, CallState::Ended).await.unwrap();
    assert_eq!(hub.sent_by(&p1_id, "end-call"), 1);
    assert_eq!(hub.sent_by(&p2_id, "end-call"), 0);
}
