use duet_client::{LocalStream, NegotiationEngine, NegotiationError, TrackKind};

use crate::integration::init_tracing;

#[tokio::test]
async fn test_webrtc_round_trip() {
    init_tracing();

    let (alice, _alice_events) = NegotiationEngine::with_webrtc(&[])
        .await
        .expect("Failed to create alice's engine");
    let (bob, _bob_events) = NegotiationEngine::with_webrtc(&[])
        .await
        .expect("Failed to create bob's engine");

    let mut stream = LocalStream::new("alice-stream");
    let mic = stream.new_track(TrackKind::Audio);
    alice.attach_track(&mic).await.unwrap();

    let offer = alice.create_offer().await.expect("offer failed");
    assert!(offer.is_offer());
    assert!(offer.sdp.contains("m=audio"));

    let answer = bob.create_answer(offer).await.expect("answer failed");
    assert!(!answer.is_offer());
    assert!(answer.sdp.contains("m=audio"));

    alice.apply_remote_answer(answer).await.expect("apply failed");
    assert!(alice.pending_offer().unwrap().is_none());

    // webrtc-rs cannot take a committed offer back; it stays outstanding.
    let second = alice.create_offer().await.expect("second offer failed");
    assert!(matches!(
        alice.rollback_offer().await,
        Err(NegotiationError::RollbackUnsupported)
    ));
    assert_eq!(alice.pending_offer().unwrap(), Some(second));

    let stray = bob
        .apply_remote_answer(duet_core::SessionDescription::answer("v=0"))
        .await;
    assert!(matches!(stray, Err(NegotiationError::NoPendingOffer)));

    alice.close().await.unwrap();
    alice.close().await.unwrap();
    bob.close().await.unwrap();
    assert!(matches!(
        alice.create_offer().await,
        Err(NegotiationError::Closed)
    ));
}
