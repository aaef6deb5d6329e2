use duet_core::{ClientSignal, ServerSignal, SessionDescription};

use crate::integration::init_tracing;
use crate::utils::{WsTestClient, spawn_relay};

#[tokio::test]
async fn test_relay_forwards_call_between_room_members() {
    init_tracing();
    let addr = spawn_relay().await.expect("Failed to start relay");

    let mut p1 = WsTestClient::connect(addr).await.expect("p1 connect");
    let mut p2 = WsTestClient::connect(addr).await.expect("p2 connect");

    p1.join("abc").await.unwrap();
    assert!(matches!(
        p1.recv().await.unwrap(),
        ServerSignal::RoomJoined { .. }
    ));

    p2.join("abc").await.unwrap();
    assert!(matches!(
        p2.recv().await.unwrap(),
        ServerSignal::RoomJoined { .. }
    ));
    assert_eq!(
        p2.recv().await.unwrap(),
        ServerSignal::UserJoined {
            remote_peer_id: p1.peer_id.clone()
        }
    );
    assert_eq!(
        p1.recv().await.unwrap(),
        ServerSignal::UserJoined {
            remote_peer_id: p2.peer_id.clone()
        }
    );

    let offer = SessionDescription::offer("v=0\r\n");
    p1.send(&ClientSignal::CallUser {
        to: p2.peer_id.clone(),
        offer: offer.clone(),
    })
    .await
    .unwrap();
    assert_eq!(
        p2.recv().await.unwrap(),
        ServerSignal::IncomingCall {
            from: p1.peer_id.clone(),
            offer,
        }
    );

    let answer = SessionDescription::answer("v=0\r\n");
    p2.send(&ClientSignal::CallAccepted {
        to: p1.peer_id.clone(),
        answer: answer.clone(),
    })
    .await
    .unwrap();
    assert_eq!(
        p1.recv().await.unwrap(),
        ServerSignal::CallAccepted {
            from: p2.peer_id.clone(),
            answer,
        }
    );

    p1.close().await.unwrap();
    p2.close().await.unwrap();
}
