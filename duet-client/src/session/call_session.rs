use crate::engine::{NegotiationEngine, PeerConnectionState};
use crate::error::CallError;
use crate::media::{LocalStream, LocalTrack, MediaConstraints, RemoteStream, RemoteTrack};
use crate::session::{CallState, OutboundSignal, SignalingOutput, TerminateReason};
use duet_core::{PeerId, RoomId, SessionDescription};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Answer incoming calls without waiting for `accept()`.
    pub auto_answer: bool,
    pub media: MediaConstraints,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            auto_answer: true,
            media: MediaConstraints::default(),
        }
    }
}

/// What the UI layer gets to see.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: CallState,
    pub remote_peer_id: Option<PeerId>,
    pub local_stream_id: Option<String>,
    pub remote_stream: Option<RemoteStream>,
}

/// Call state machine for one room membership.
///
/// Every transition goes through `&mut self`, so whoever owns the session serializes them.
/// Negotiation is delegated to the engine; signals to the remote go out through the
/// [`SignalingOutput`] seam.
pub struct CallSession {
    local_id: PeerId,
    room_id: RoomId,
    remote_peer_id: Option<PeerId>,
    state: CallState,
    engine: Arc<NegotiationEngine>,
    output: Arc<dyn SignalingOutput>,
    local_stream: Option<LocalStream>,
    remote_stream: Option<RemoteStream>,
    pending_incoming: Option<SessionDescription>,
    renegotiation_queued: bool,
    options: SessionOptions,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl CallSession {
    pub fn new(
        local_id: PeerId,
        room_id: RoomId,
        engine: Arc<NegotiationEngine>,
        output: Arc<dyn SignalingOutput>,
        options: SessionOptions,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot {
            state: CallState::Idle,
            remote_peer_id: None,
            local_stream_id: None,
            remote_stream: None,
        });

        Self {
            local_id,
            room_id,
            remote_peer_id: None,
            state: CallState::Idle,
            engine,
            output,
            local_stream: None,
            remote_stream: None,
            pending_incoming: None,
            renegotiation_queued: false,
            options,
            snapshot_tx,
        }
    }

    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn remote_peer_id(&self) -> Option<&PeerId> {
        self.remote_peer_id.as_ref()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn has_local_media(&self) -> bool {
        self.local_stream.as_ref().is_some_and(|s| !s.is_empty())
    }

    pub fn engine(&self) -> &Arc<NegotiationEngine> {
        &self.engine
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            remote_peer_id: self.remote_peer_id.clone(),
            local_stream_id: self.local_stream.as_ref().map(|s| s.id.clone()),
            remote_stream: self.remote_stream.clone(),
        }
    }

    // ---- local media ----

    /// Takes ownership of freshly acquired media and hands its tracks to the engine.
    pub async fn on_local_media(&mut self, stream: LocalStream) -> Result<(), CallError> {
        if self.state.is_closing() {
            stream.stop();
            return Err(CallError::SessionEnded);
        }
        if self.local_stream.is_some() {
            debug!("Local media already present; dropping stream {}", stream.id);
            stream.stop();
            return Ok(());
        }

        for track in &stream.tracks {
            if let Err(e) = self.engine.attach_track(track).await {
                stream.stop();
                return Err(e.into());
            }
        }

        info!("Local media ready ({} tracks)", stream.tracks.len());
        self.local_stream = Some(stream);
        self.publish();
        Ok(())
    }

    /// Adds one more local track. An established call renegotiates once the engine asks.
    pub async fn attach_track(&mut self, track: LocalTrack) -> Result<(), CallError> {
        if self.state.is_closing() {
            track.stop();
            return Err(CallError::SessionEnded);
        }

        self.engine.attach_track(&track).await?;
        self.local_stream
            .get_or_insert_with(|| LocalStream::new(track.stream_id()))
            .add_track(track);
        self.publish();
        Ok(())
    }

    // ---- room membership ----

    pub fn on_peer_joined(&mut self, remote: PeerId) -> Result<(), CallError> {
        if self.state.is_closing() {
            return Err(CallError::SessionEnded);
        }

        match &self.remote_peer_id {
            Some(known) if *known == remote => {
                debug!("Duplicate join for {}", remote);
                return Ok(());
            }
            Some(_) if self.state != CallState::WaitingForRemote => {
                return Err(CallError::BusySession);
            }
            _ => {}
        }

        info!("Remote peer {} joined room {}", remote, self.room_id);
        self.remote_peer_id = Some(remote);
        if self.state == CallState::Idle {
            self.set_state(CallState::WaitingForRemote);
        } else {
            self.publish();
        }
        Ok(())
    }

    /// The directory reports an occupant left. Only the recorded remote matters.
    pub fn on_peer_left(&mut self, remote: &PeerId) -> Result<(), CallError> {
        if self.remote_peer_id.as_ref() != Some(remote) {
            return Err(CallError::UnknownPeer(remote.clone()));
        }
        info!("Remote peer {} left", remote);
        self.terminate(TerminateReason::RemoteEnd);
        Ok(())
    }

    pub fn on_rejected(&mut self) {
        warn!("Room {} is full", self.room_id);
        self.terminate(TerminateReason::Rejected);
    }

    // ---- initial call ----

    pub async fn call(&mut self) -> Result<(), CallError> {
        match self.state {
            CallState::WaitingForRemote => {}
            CallState::Idle => return Err(CallError::NoRemotePeer),
            CallState::Connected | CallState::Negotiating | CallState::IncomingPending => {
                return Err(CallError::BusySession);
            }
            CallState::Ending | CallState::Ended => return Err(CallError::SessionEnded),
            state => {
                return Err(CallError::InvalidTransition {
                    state,
                    action: "call",
                });
            }
        }
        if !self.has_local_media() {
            return Err(CallError::MediaNotReady);
        }
        let to = self.remote_peer_id.clone().ok_or(CallError::NoRemotePeer)?;

        let offer = self.engine.create_offer().await?;
        self.output
            .deliver(OutboundSignal::CallOffer {
                to: to.clone(),
                offer,
            })
            .map_err(CallError::SignalingDeliveryFailed)?;

        info!("Calling {}", to);
        self.set_state(CallState::Calling);
        Ok(())
    }

    pub async fn on_incoming_call(
        &mut self,
        from: PeerId,
        offer: SessionDescription,
    ) -> Result<(), CallError> {
        if self.state.is_closing() {
            return Err(CallError::SessionEnded);
        }
        if self.state == CallState::Idle {
            self.remote_peer_id = Some(from.clone());
            self.set_state(CallState::WaitingForRemote);
        }
        if self.remote_peer_id.as_ref() != Some(&from) {
            return Err(CallError::UnknownPeer(from));
        }

        match self.state {
            CallState::WaitingForRemote => {
                // An offer left over from a failed or cancelled call never reached the remote.
                if let Err(e) = self.engine.rollback_offer().await {
                    debug!("Stale local offer kept: {}", e);
                }
            }
            CallState::IncomingPending if self.pending_incoming.as_ref() == Some(&offer) => {
                debug!("Duplicate call offer from {}", from);
                return Ok(());
            }
            CallState::Calling => {
                if !self.yields_to(&from) {
                    debug!("Call glare with {}; keeping our offer", from);
                    return Err(CallError::BusySession);
                }
                info!("Call glare with {}; answering theirs", from);
                self.withdraw_offer_for_glare().await?;
            }
            _ => return Err(CallError::BusySession),
        }

        info!("Incoming call from {}", from);
        self.pending_incoming = Some(offer);
        self.set_state(CallState::IncomingPending);

        if self.options.auto_answer {
            if let Err(e) = self.answer_incoming().await {
                // Only an undelivered answer leaves the offer worth holding for `accept()`.
                if matches!(e, CallError::Negotiation(_)) {
                    self.pending_incoming = None;
                    self.set_state(CallState::WaitingForRemote);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Answers the held incoming offer.
    pub async fn accept(&mut self) -> Result<(), CallError> {
        match self.state {
            CallState::IncomingPending => self.answer_incoming().await,
            CallState::Ending | CallState::Ended => Err(CallError::SessionEnded),
            state => Err(CallError::InvalidTransition {
                state,
                action: "accept",
            }),
        }
    }

    async fn answer_incoming(&mut self) -> Result<(), CallError> {
        let offer = self
            .pending_incoming
            .clone()
            .ok_or(CallError::InvalidTransition {
                state: self.state,
                action: "accept",
            })?;
        let to = self.remote_peer_id.clone().ok_or(CallError::NoRemotePeer)?;

        let answer = self.engine.create_answer(offer).await?;
        self.output
            .deliver(OutboundSignal::CallAnswer { to, answer })
            .map_err(CallError::SignalingDeliveryFailed)?;

        self.pending_incoming = None;
        self.set_state(CallState::Connected);
        self.replay_renegotiation().await;
        Ok(())
    }

    pub async fn on_call_accepted(&mut self, answer: SessionDescription) -> Result<(), CallError> {
        match self.state {
            CallState::Calling => {}
            CallState::Ending | CallState::Ended => return Err(CallError::SessionEnded),
            state => {
                return Err(CallError::InvalidTransition {
                    state,
                    action: "apply call answer",
                });
            }
        }

        self.engine.apply_remote_answer(answer).await?;
        self.set_state(CallState::Connected);
        self.replay_renegotiation().await;
        Ok(())
    }

    // ---- renegotiation ----

    pub async fn on_renegotiation_needed(&mut self) -> Result<(), CallError> {
        match self.state {
            CallState::Connected => {}
            CallState::Calling | CallState::IncomingPending | CallState::Negotiating => {
                debug!("Renegotiation queued while {}", self.state);
                self.renegotiation_queued = true;
                return Ok(());
            }
            state => {
                debug!("Ignoring renegotiation trigger while {}", state);
                return Ok(());
            }
        }

        // Transitions are serialized, so no engine operation can be holding the slot here.
        let outstanding = self.engine.pending_offer()?.is_some();
        if !self.engine.needs_renegotiation() && !outstanding {
            debug!("Stale renegotiation trigger dropped");
            return Ok(());
        }
        let to = self.remote_peer_id.clone().ok_or(CallError::NoRemotePeer)?;

        let offer = self.engine.create_offer().await?;
        self.output
            .deliver(OutboundSignal::RenegotiationOffer { to, offer })
            .map_err(CallError::SignalingDeliveryFailed)?;

        self.set_state(CallState::Negotiating);
        Ok(())
    }

    /// Answers a renegotiation from the remote. The session stays `Connected`; a side that
    /// yields in glare drops back to `Connected` first and re-offers afterwards.
    pub async fn on_renegotiation_offer(
        &mut self,
        from: PeerId,
        offer: SessionDescription,
    ) -> Result<(), CallError> {
        if self.state.is_closing() {
            return Err(CallError::SessionEnded);
        }
        if self.remote_peer_id.as_ref() != Some(&from) {
            return Err(CallError::UnknownPeer(from));
        }
        match self.state {
            CallState::Connected => {}
            CallState::Negotiating => {
                if !self.yields_to(&from) {
                    debug!("Renegotiation glare with {}; keeping our offer", from);
                    return Err(CallError::BusySession);
                }
                info!("Renegotiation glare with {}; answering theirs first", from);
                self.withdraw_offer_for_glare().await?;
                self.renegotiation_queued = true;
                self.set_state(CallState::Connected);
            }
            state => {
                return Err(CallError::InvalidTransition {
                    state,
                    action: "answer renegotiation",
                });
            }
        }

        let answer = self.engine.create_answer(offer).await?;
        self.output
            .deliver(OutboundSignal::RenegotiationAnswer { to: from, answer })
            .map_err(CallError::SignalingDeliveryFailed)?;
        debug!("Renegotiation answered");
        self.replay_renegotiation().await;
        Ok(())
    }

    /// Glare tie-break: the peer with the lower id keeps its offer, the other one yields.
    fn yields_to(&self, remote: &PeerId) -> bool {
        self.local_id > *remote
    }

    /// Takes our offer back so the remote's can be answered. A connection that cannot
    /// roll back would leave both sides waiting on each other, so the call is ended.
    async fn withdraw_offer_for_glare(&mut self) -> Result<(), CallError> {
        if let Err(e) = self.engine.rollback_offer().await {
            error!("Cannot withdraw local offer during glare: {}", e);
            self.terminate(TerminateReason::LocalEnd);
            return Err(e.into());
        }
        Ok(())
    }

    pub async fn on_renegotiation_answer(
        &mut self,
        answer: SessionDescription,
    ) -> Result<(), CallError> {
        match self.state {
            CallState::Negotiating => {}
            CallState::Ending | CallState::Ended => return Err(CallError::SessionEnded),
            state => {
                return Err(CallError::InvalidTransition {
                    state,
                    action: "apply renegotiation answer",
                });
            }
        }

        self.engine.apply_remote_answer(answer).await?;
        self.set_state(CallState::Connected);
        self.replay_renegotiation().await;
        Ok(())
    }

    async fn replay_renegotiation(&mut self) {
        if !std::mem::take(&mut self.renegotiation_queued) {
            return;
        }
        if let Err(e) = self.on_renegotiation_needed().await {
            warn!("Queued renegotiation failed: {}", e);
        }
    }

    // ---- engine notifications ----

    pub fn on_track_received(&mut self, track: RemoteTrack) {
        if self.state.is_closing() {
            return;
        }

        let stream = self
            .remote_stream
            .get_or_insert_with(|| RemoteStream::new(track.stream_id.clone()));
        info!("Remote {} track {} received", track.kind, track.id);
        if stream.add_track(track) {
            self.publish();
        }
    }

    pub fn on_connection_state(&mut self, state: PeerConnectionState) {
        debug!("Connection state {:?} while {}", state, self.state);
        if !state.is_lost() || self.state.is_closing() {
            return;
        }
        if self.engine.is_closed() {
            // Sealed by a local end request that is still on its way to this session.
            debug!("Ignoring {:?} from a locally closed connection", state);
            return;
        }
        self.terminate(TerminateReason::TransportLost);
    }

    // ---- teardown ----

    /// Withdraws an outgoing call or declines a held incoming one. Nothing is sent.
    pub async fn cancel(&mut self) -> Result<(), CallError> {
        match self.state {
            CallState::Calling => {
                info!("Outgoing call cancelled");
                if let Err(e) = self.engine.rollback_offer().await {
                    warn!("Outgoing offer kept after cancel: {}", e);
                }
            }
            CallState::IncomingPending => {
                info!("Incoming call declined");
                self.pending_incoming = None;
            }
            CallState::Ending | CallState::Ended => return Err(CallError::SessionEnded),
            state => {
                return Err(CallError::InvalidTransition {
                    state,
                    action: "cancel",
                });
            }
        }

        self.renegotiation_queued = false;
        self.set_state(CallState::WaitingForRemote);
        Ok(())
    }

    pub fn end(&mut self) {
        self.terminate(TerminateReason::LocalEnd);
    }

    pub fn on_call_ended(&mut self) {
        self.terminate(TerminateReason::RemoteEnd);
    }

    /// Tears the session down. Runs once; later calls are no-ops.
    pub fn terminate(&mut self, reason: TerminateReason) {
        if self.state.is_closing() {
            return;
        }

        info!("Ending call ({:?})", reason);
        self.set_state(CallState::Ending);

        self.engine.close_detached();
        if let Some(stream) = self.local_stream.take() {
            stream.stop();
        }
        self.remote_stream = None;
        self.pending_incoming = None;
        self.renegotiation_queued = false;

        if reason == TerminateReason::LocalEnd {
            if let Some(to) = self.remote_peer_id.clone() {
                if let Err(e) = self.output.deliver(OutboundSignal::EndCall { to }) {
                    warn!("Could not notify remote of call end: {}", e);
                }
            }
        }

        self.set_state(CallState::Ended);
    }

    fn set_state(&mut self, next: CallState) {
        if self.state != next {
            debug!("Call state {} -> {}", self.state, next);
            self.state = next;
        }
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}
