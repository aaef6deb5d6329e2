use crate::error::NegotiationError;
use crate::media::LocalTrack;
use async_trait::async_trait;
use duet_core::SessionDescription;

/// The real-time connection resource a [`NegotiationEngine`](super::NegotiationEngine) drives.
///
/// Implementations push notifications through the `EngineEvent` sender they were built with.
#[async_trait]
pub trait PeerBackend: Send + Sync {
    /// Generates and commits a local offer.
    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError>;

    /// Commits `offer` remotely, then generates and commits a local answer.
    async fn create_answer(
        &self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError>;

    async fn apply_answer(&self, answer: SessionDescription) -> Result<(), NegotiationError>;

    /// Discards the committed local offer and returns to a stable signaling state.
    async fn rollback(&self) -> Result<(), NegotiationError>;

    async fn add_track(&self, track: &LocalTrack) -> Result<(), NegotiationError>;

    async fn close(&self) -> Result<(), NegotiationError>;
}
