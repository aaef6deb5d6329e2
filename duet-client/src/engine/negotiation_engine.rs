use crate::engine::{EngineEvent, MemoryBackend, PeerBackend, WebRtcBackend};
use crate::error::NegotiationError;
use crate::media::LocalTrack;
use duet_core::{IceServerConfig, SessionDescription};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

const EVENT_BUFFER: usize = 256;

#[derive(Default)]
struct NegotiationSlot {
    /// Local offer committed but not yet answered.
    pending_offer: Option<SessionDescription>,
}

/// Owns one peer-connection resource for the lifetime of a room membership.
///
/// Offer/answer operations must be serialized by the caller. Overlapping calls fail with
/// [`NegotiationError::InProgress`] instead of waiting.
pub struct NegotiationEngine {
    backend: Arc<dyn PeerBackend>,
    slot: Mutex<NegotiationSlot>,
    closed: AtomicBool,
    tracks_changed: AtomicBool,
}

impl NegotiationEngine {
    pub fn new(backend: Arc<dyn PeerBackend>) -> Self {
        Self {
            backend,
            slot: Mutex::new(NegotiationSlot::default()),
            closed: AtomicBool::new(false),
            tracks_changed: AtomicBool::new(false),
        }
    }

    pub async fn with_webrtc(
        ice_servers: &[IceServerConfig],
    ) -> Result<(Arc<Self>, mpsc::Receiver<EngineEvent>), NegotiationError> {
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let backend = WebRtcBackend::new(ice_servers, event_tx).await?;
        Ok((Arc::new(Self::new(Arc::new(backend))), event_rx))
    }

    pub fn in_memory() -> (Arc<Self>, mpsc::Receiver<EngineEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let backend = MemoryBackend::new(event_tx);
        (Arc::new(Self::new(Arc::new(backend))), event_rx)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// The outstanding local offer, if any.
    ///
    /// Fails with [`NegotiationError::InProgress`] while another operation holds the slot,
    /// since the answer is not known until that operation settles.
    pub fn pending_offer(&self) -> Result<Option<SessionDescription>, NegotiationError> {
        let slot = self
            .slot
            .try_lock()
            .map_err(|_| NegotiationError::InProgress)?;
        Ok(slot.pending_offer.clone())
    }

    /// Local tracks were attached after the last offer this side generated.
    pub fn needs_renegotiation(&self) -> bool {
        self.tracks_changed.load(Ordering::SeqCst)
    }

    /// Generates and commits a local offer.
    ///
    /// An offer that is still outstanding is returned again instead of generating a new one.
    pub async fn create_offer(&self) -> Result<SessionDescription, NegotiationError> {
        self.ensure_open()?;
        let mut slot = self
            .slot
            .try_lock()
            .map_err(|_| NegotiationError::InProgress)?;

        if let Some(offer) = &slot.pending_offer {
            debug!("Reusing outstanding local offer");
            return Ok(offer.clone());
        }

        self.tracks_changed.store(false, Ordering::SeqCst);
        let offer = match self.backend.create_offer().await {
            Ok(offer) => offer,
            Err(e) => {
                self.tracks_changed.store(true, Ordering::SeqCst);
                return Err(e);
            }
        };
        self.ensure_open()?;

        slot.pending_offer = Some(offer.clone());
        Ok(offer)
    }

    pub async fn create_answer(
        &self,
        remote_offer: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        self.ensure_open()?;
        if !remote_offer.is_offer() {
            return Err(NegotiationError::InvalidDescription(
                "expected an offer".into(),
            ));
        }

        let slot = self
            .slot
            .try_lock()
            .map_err(|_| NegotiationError::InProgress)?;
        if slot.pending_offer.is_some() {
            return Err(NegotiationError::InProgress);
        }

        let answer = self.backend.create_answer(remote_offer).await?;
        self.ensure_open()?;
        Ok(answer)
    }

    pub async fn apply_remote_answer(
        &self,
        answer: SessionDescription,
    ) -> Result<(), NegotiationError> {
        self.ensure_open()?;
        if answer.is_offer() {
            return Err(NegotiationError::InvalidDescription(
                "expected an answer".into(),
            ));
        }

        let mut slot = self
            .slot
            .try_lock()
            .map_err(|_| NegotiationError::InProgress)?;
        if slot.pending_offer.is_none() {
            return Err(NegotiationError::NoPendingOffer);
        }

        self.backend.apply_answer(answer).await?;
        self.ensure_open()?;

        slot.pending_offer = None;
        Ok(())
    }

    /// Withdraws the outstanding local offer. Does nothing if none is outstanding.
    ///
    /// The tracks it described count as unnegotiated again.
    pub async fn rollback_offer(&self) -> Result<(), NegotiationError> {
        self.ensure_open()?;
        let mut slot = self
            .slot
            .try_lock()
            .map_err(|_| NegotiationError::InProgress)?;
        if slot.pending_offer.is_none() {
            return Ok(());
        }

        self.backend.rollback().await?;
        self.ensure_open()?;

        slot.pending_offer = None;
        self.tracks_changed.store(true, Ordering::SeqCst);
        debug!("Outstanding local offer withdrawn");
        Ok(())
    }

    pub async fn attach_track(&self, track: &LocalTrack) -> Result<(), NegotiationError> {
        self.ensure_open()?;
        self.backend.add_track(track).await?;
        self.tracks_changed.store(true, Ordering::SeqCst);
        debug!("Attached {} track {}", track.kind(), track.id());
        Ok(())
    }

    /// Releases the connection. Calling it again does nothing.
    pub async fn close(&self) -> Result<(), NegotiationError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.backend.close().await
    }

    /// Seals the engine at once and releases the connection in the background.
    pub fn close_detached(self: &Arc<Self>) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let backend = self.backend.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = backend.close().await {
                        warn!("Failed to close peer connection: {}", e);
                    }
                });
            }
            Err(_) => warn!("No runtime to release peer connection on"),
        }
    }

    fn ensure_open(&self) -> Result<(), NegotiationError> {
        if self.is_closed() {
            return Err(NegotiationError::Closed);
        }
        Ok(())
    }
}
