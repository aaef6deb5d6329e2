use crate::error::SignalingError;
use crate::signaling::{SignalingChannel, SignalingLink};
use async_trait::async_trait;
use duet_core::{ClientSignal, PeerId, ServerSignal};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Signaling over a WebSocket to the relay's `/ws/{peer_id}` endpoint.
#[derive(Debug, Clone)]
pub struct WsSignalingChannel {
    base_url: String,
}

impl WsSignalingChannel {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn url_for(&self, local_id: &PeerId) -> String {
        format!("{}/ws/{}", self.base_url.trim_end_matches('/'), local_id)
    }

    async fn sender_task(
        mut write: SplitSink<WsStream, Message>,
        mut rx: mpsc::UnboundedReceiver<ClientSignal>,
    ) {
        while let Some(signal) = rx.recv().await {
            let json = match serde_json::to_string(&signal) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signal: {}", e);
                    continue;
                }
            };
            if let Err(e) = write.send(Message::Text(json)).await {
                error!("Failed to send WebSocket message: {}", e);
                return;
            }
        }

        // Every sender is gone: the session is over.
        let _ = write.send(Message::Close(None)).await;
        debug!("Sender task terminated");
    }

    async fn receiver_task(
        mut read: SplitStream<WsStream>,
        tx: mpsc::UnboundedSender<ServerSignal>,
    ) {
        while let Some(msg_result) = read.next().await {
            match msg_result {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerSignal>(&text) {
                    Ok(signal) => {
                        if tx.send(signal).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Invalid signal from directory: {}", e),
                },
                Ok(Message::Close(_)) => {
                    info!("Signaling connection closed by server");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        debug!("Receiver task terminated");
    }
}

#[async_trait]
impl SignalingChannel for WsSignalingChannel {
    async fn connect(&self, local_id: &PeerId) -> Result<SignalingLink, SignalingError> {
        let url = self.url_for(local_id);
        info!("Connecting to signaling server: {}", url);

        let (ws_stream, _) =
            connect_async(url.as_str())
                .await
                .map_err(|e| SignalingError::Connect {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;

        let (write, read) = ws_stream.split();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::sender_task(write, out_rx));
        tokio::spawn(Self::receiver_task(read, in_tx));

        Ok(SignalingLink {
            sender: out_tx,
            receiver: in_rx,
        })
    }
}
