use duet_client::{CallState, WsSignalingChannel};
use tokio::net::TcpListener;

use crate::integration::init_tracing;
use crate::utils::{join_peer, wait_for_media, wait_for_state, with_media};

#[tokio::test]
async fn test_call_over_websocket_relay() {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = duet_server::serve_on(listener).await;
    });
    let channel = WsSignalingChannel::new(format!("ws://{addr}"));

    let p1 = join_peer(&channel, "ws-room", with_media()).await.unwrap();
    let p2 = join_peer(&channel, "ws-room", with_media()).await.unwrap();

    let s1 = wait_for_state(&p1.handle, CallState::WaitingForRemote)
        .await
        .unwrap();
    assert_eq!(s1.remote_peer_id.as_ref(), Some(p2.handle.local_id()));
    wait_for_state(&p2.handle, CallState::WaitingForRemote)
        .await
        .unwrap();
    wait_for_media(&p1.handle).await.unwrap();

    p1.handle.call().await.unwrap();
    wait_for_state(&p1.handle, CallState::Connected).await.unwrap();
    wait_for_state(&p2.handle, CallState::Connected).await.unwrap();

    p1.handle.end();
    wait_for_state(&p2.handle, CallState::Ended).await.unwrap();
    p1.task.await.unwrap();
    p2.task.await.unwrap();
}
