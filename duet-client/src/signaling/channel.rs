use crate::error::SignalingError;
use async_trait::async_trait;
use duet_core::{ClientSignal, PeerId, ServerSignal};
use tokio::sync::mpsc;

/// An open connection to the signaling directory.
///
/// Dropping every clone of `sender` closes the connection once queued signals are flushed.
pub struct SignalingLink {
    pub sender: mpsc::UnboundedSender<ClientSignal>,
    pub receiver: mpsc::UnboundedReceiver<ServerSignal>,
}

#[async_trait]
pub trait SignalingChannel: Send + Sync {
    async fn connect(&self, local_id: &PeerId) -> Result<SignalingLink, SignalingError>;
}
