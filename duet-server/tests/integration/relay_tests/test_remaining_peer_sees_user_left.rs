use duet_core::ServerSignal;

use crate::integration::init_tracing;
use crate::utils::{WsTestClient, spawn_relay};

#[tokio::test]
async fn test_remaining_peer_sees_user_left() {
    init_tracing();
    let addr = spawn_relay().await.expect("Failed to start relay");

    let mut p1 = WsTestClient::connect(addr).await.unwrap();
    let mut p2 = WsTestClient::connect(addr).await.unwrap();
    p1.join("leave-room").await.unwrap();
    p1.recv().await.unwrap();
    p2.join("leave-room").await.unwrap();
    p2.recv().await.unwrap();
    p2.recv().await.unwrap();
    p1.recv().await.unwrap();

    let p1_id = p1.peer_id.clone();
    p1.close().await.unwrap();

    assert_eq!(
        p2.recv().await.unwrap(),
        ServerSignal::UserLeft {
            remote_peer_id: p1_id
        }
    );

    let mut p3 = WsTestClient::connect(addr).await.unwrap();
    p3.join("leave-room").await.unwrap();
    assert!(matches!(
        p3.recv().await.unwrap(),
        ServerSignal::RoomJoined { .. }
    ));
}
