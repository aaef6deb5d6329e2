use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::integration::init_tracing;
use crate::utils::spawn_relay;

#[tokio::test]
async fn test_malformed_peer_id_is_refused() {
    init_tracing();
    let addr = spawn_relay().await.expect("Failed to start relay");

    let url = format!("ws://{addr}/ws/not-a-uuid");
    let res = connect_async(url.as_str()).await;

    match res {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 400),
        other => panic!("expected HTTP 400, got {:?}", other.map(|_| ())),
    }
}
