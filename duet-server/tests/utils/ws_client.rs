use anyhow::{Context, Result, anyhow};
use duet_core::{ClientSignal, PeerId, ServerSignal};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for a single signal to arrive (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 5000;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Starts a relay on an OS-picked port.
pub async fn spawn_relay() -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = duet_server::serve_on(listener).await;
    });
    Ok(addr)
}

/// Raw WebSocket peer speaking the signaling protocol.
pub struct WsTestClient {
    pub peer_id: PeerId,
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
}

impl WsTestClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let peer_id = PeerId::new();
        let url = format!("ws://{addr}/ws/{peer_id}");
        let (stream, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {url}"))?;
        let (write, read) = stream.split();
        Ok(Self {
            peer_id,
            write,
            read,
        })
    }

    pub async fn send(&mut self, signal: &ClientSignal) -> Result<()> {
        let json = serde_json::to_string(signal)?;
        self.write.send(Message::Text(json)).await?;
        Ok(())
    }

    pub async fn join(&mut self, room: &str) -> Result<()> {
        let signal = ClientSignal::JoinRoom {
            local_id: self.peer_id.clone(),
            room_id: room.into(),
        };
        self.send(&signal).await
    }

    /// Next signal, skipping non-text frames.
    pub async fn recv(&mut self) -> Result<ServerSignal> {
        let deadline = Duration::from_millis(SIGNAL_TIMEOUT_MS);
        tokio::time::timeout(deadline, async {
            loop {
                match self.read.next().await {
                    Some(Ok(Message::Text(text))) => return Ok(serde_json::from_str(&text)?),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(e.into()),
                    None => return Err(anyhow!("connection closed")),
                }
            }
        })
        .await
        .context("Timed out waiting for signal")?
    }

    pub async fn close(mut self) -> Result<()> {
        self.write.send(Message::Close(None)).await?;
        Ok(())
    }
}
