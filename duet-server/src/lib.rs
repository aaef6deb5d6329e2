pub mod config;
pub mod room;
pub mod signaling;

pub use config::RelayConfig;
pub use room::{JoinOutcome, ROOM_CAPACITY, RoomDirectory};
pub use signaling::{SignalingService, ws_handler};

use axum::Router;
use axum::routing::get;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(service: SignalingService) -> Router {
    Router::new()
        .route("/ws/{peer_id}", get(ws_handler))
        .with_state(service)
}

/// Binds `config.addr` and serves the relay until the process stops.
pub async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.addr).await?;
    serve_on(listener).await
}

/// Serves on an already bound listener. Handy when the port is picked by the OS.
pub async fn serve_on(listener: TcpListener) -> anyhow::Result<()> {
    let addr: SocketAddr = listener.local_addr()?;
    info!("Relay listening on {}", addr);

    axum::serve(listener, router(SignalingService::new())).await?;
    Ok(())
}
