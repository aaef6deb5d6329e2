use duet_client::{CallState, LocalTrack, TrackKind};

use crate::integration::init_tracing;
use crate::utils::{LoopbackHub, paired_peers, wait_for_condition, wait_for_state};

#[tokio::test]
async fn test_end_during_negotiation() {
    init_tracing();
    let hub = LoopbackHub::new();
    let (p1, p2) = paired_peers(&hub, "abc").await.unwrap();
    let p2_id = p2.handle.local_id().clone();

    p1.handle.call().await.unwrap();
    wait_for_state(&p1.handle, CallState::Connected).await.unwrap();
    wait_for_state(&p2.handle, CallState::Connected).await.unwrap();

    // Park p2's renegotiation answer so p1 stays mid-negotiation.
    hub.hold("peer:nego:final");
    let track = LocalTrack::new(TrackKind::Video, "screen", "extra");
    p1.handle.attach_track(track.clone()).await.unwrap();
    wait_for_state(&p1.handle, CallState::Negotiating)
        .await
        .unwrap();
    wait_for_condition(|| hub.parked_count() == 1)
        .await
        .expect("p2 never answered");

    p2.handle.end();

    let ended = wait_for_state(&p1.handle, CallState::Ended).await.unwrap();
    assert!(ended.local_stream_id.is_none());
    assert!(track.is_stopped());
    wait_for_state(&p2.handle, CallState::Ended).await.unwrap();

    // The stale answer goes nowhere: p1 is gone from the relay.
    hub.release();
    p1.task.await.unwrap();
    p2.task.await.unwrap();
    assert_eq!(hub.sent_by(&p2_id, "end-call"), 1);
    wait_for_condition(|| hub.occupants("abc") == 0)
        .await
        .expect("both peers should leave the room");
}
