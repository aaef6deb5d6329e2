use crate::config::ClientConfig;
use crate::engine::{EngineEvent, NegotiationEngine};
use crate::error::{CallError, JoinError, MediaError, SignalingError};
use crate::media::{LocalStream, MediaSource};
use crate::session::{
    CallSession, OutboundSignal, SessionHandle, SessionOptions, SignalingOutput, UserIntent,
};
use crate::signaling::{SignalingChannel, WsSignalingChannel};
use duet_core::{ClientSignal, PeerId, RoomId, ServerSignal, SignalingEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Turns session outputs into named client events on the signaling link.
struct LinkOutput {
    sender: mpsc::UnboundedSender<ClientSignal>,
}

impl SignalingOutput for LinkOutput {
    fn deliver(&self, signal: OutboundSignal) -> Result<(), SignalingError> {
        self.sender
            .send(signal.into_client_signal())
            .map_err(|_| SignalingError::Closed)
    }
}

/// Owns a [`CallSession`] and drives it from signaling, engine notifications, user intents
/// and media acquisition, one event at a time.
pub struct RoomCoordinator {
    session: CallSession,
    inbound: mpsc::UnboundedReceiver<ServerSignal>,
    inbound_open: bool,
    engine_events: mpsc::Receiver<EngineEvent>,
    engine_open: bool,
    intents: mpsc::UnboundedReceiver<UserIntent>,
    media: Arc<dyn MediaSource>,
    media_tx: mpsc::Sender<Result<LocalStream, MediaError>>,
    media_rx: mpsc::Receiver<Result<LocalStream, MediaError>>,
    media_pending: bool,
}

impl RoomCoordinator {
    /// Connects to the directory, asks to join `room_id` and starts the session task.
    ///
    /// Local media is requested in the background; the returned handle is usable at once.
    pub async fn join(
        room_id: RoomId,
        channel: &dyn SignalingChannel,
        engine: Arc<NegotiationEngine>,
        engine_events: mpsc::Receiver<EngineEvent>,
        media: Arc<dyn MediaSource>,
        options: SessionOptions,
    ) -> Result<(SessionHandle, JoinHandle<()>), JoinError> {
        let local_id = PeerId::new();
        let link = channel.connect(&local_id).await?;

        link.sender
            .send(ClientSignal::JoinRoom {
                local_id: local_id.clone(),
                room_id: room_id.clone(),
            })
            .map_err(|_| SignalingError::Closed)?;
        info!("Peer {} joining room {}", local_id, room_id);

        let output = Arc::new(LinkOutput {
            sender: link.sender,
        });
        let session = CallSession::new(
            local_id.clone(),
            room_id,
            engine.clone(),
            output,
            options,
        );

        let (intents_tx, intents_rx) = mpsc::unbounded_channel();
        let handle = SessionHandle::new(local_id, intents_tx, engine, session.subscribe());

        let (media_tx, media_rx) = mpsc::channel(1);
        let mut coordinator = Self {
            session,
            inbound: link.receiver,
            inbound_open: true,
            engine_events,
            engine_open: true,
            intents: intents_rx,
            media,
            media_tx,
            media_rx,
            media_pending: false,
        };
        coordinator.acquire_media();

        let task = tokio::spawn(coordinator.run());
        Ok((handle, task))
    }

    /// [`join`](Self::join) over WebSocket with a webrtc-rs connection, as configured.
    pub async fn join_with_config(
        room_id: RoomId,
        config: &ClientConfig,
        media: Arc<dyn MediaSource>,
    ) -> Result<(SessionHandle, JoinHandle<()>), JoinError> {
        let channel = WsSignalingChannel::new(config.signaling_url.clone());
        let (engine, engine_events) = NegotiationEngine::with_webrtc(&config.ice_servers).await?;
        Self::join(
            room_id,
            &channel,
            engine,
            engine_events,
            media,
            config.session_options(),
        )
        .await
    }

    pub async fn run(mut self) {
        info!("Session loop started for {}", self.session.local_id());

        loop {
            tokio::select! {
                biased;

                evt = self.engine_events.recv(), if self.engine_open => {
                    match evt {
                        Some(e) => self.handle_engine_event(e).await,
                        None => {
                            debug!("Engine event channel closed");
                            self.engine_open = false;
                        }
                    }
                }

                Some(result) = self.media_rx.recv() => {
                    self.handle_media(result).await;
                }

                msg = self.inbound.recv(), if self.inbound_open => {
                    match msg {
                        Some(signal) => self.handle_signal(signal).await,
                        None => {
                            warn!("Signaling channel closed; call continues without it");
                            self.inbound_open = false;
                        }
                    }
                }

                intent = self.intents.recv() => {
                    match intent {
                        Some(i) => self.handle_intent(i).await,
                        None => {
                            info!("All session handles dropped. Ending call.");
                            self.session.end();
                        }
                    }
                }
            }

            if self.session.state().is_ended() {
                break;
            }
        }

        info!("Session loop finished for {}", self.session.local_id());
    }

    async fn handle_signal(&mut self, signal: ServerSignal) {
        let Some(event) = signal.into_event() else {
            debug!("Join acknowledged by directory");
            return;
        };

        let res = match event {
            SignalingEvent::JoinRequest { room_id } => {
                debug!("Ignoring inbound join request for {}", room_id);
                Ok(())
            }
            SignalingEvent::Joined { remote_peer_id } => {
                self.session.on_peer_joined(remote_peer_id)
            }
            SignalingEvent::Left { remote_peer_id } => self.session.on_peer_left(&remote_peer_id),
            SignalingEvent::Rejected { .. } => {
                self.session.on_rejected();
                Ok(())
            }
            SignalingEvent::CallOffer { from, offer } => {
                self.session.on_incoming_call(from, offer).await
            }
            SignalingEvent::CallAnswer { answer } => self.session.on_call_accepted(answer).await,
            SignalingEvent::RenegotiationOffer { from, offer } => {
                self.session.on_renegotiation_offer(from, offer).await
            }
            SignalingEvent::RenegotiationAnswer { answer } => {
                self.session.on_renegotiation_answer(answer).await
            }
            SignalingEvent::CallEnded => {
                self.session.on_call_ended();
                Ok(())
            }
        };

        if let Err(e) = res {
            warn!("Signal rejected while {}: {}", self.session.state(), e);
        }
    }

    async fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::TrackReceived(track) => self.session.on_track_received(track),
            EngineEvent::RenegotiationNeeded => {
                if let Err(e) = self.session.on_renegotiation_needed().await {
                    warn!("Renegotiation failed: {}", e);
                }
            }
            EngineEvent::ConnectionStateChanged(state) => self.session.on_connection_state(state),
        }
    }

    async fn handle_intent(&mut self, intent: UserIntent) {
        match intent {
            UserIntent::Call { reply } => {
                let res = self.session.call().await;
                log_rejected("call", &res);
                let _ = reply.send(res);
            }
            UserIntent::Accept { reply } => {
                let res = self.session.accept().await;
                log_rejected("accept", &res);
                let _ = reply.send(res);
            }
            UserIntent::Cancel { reply } => {
                let res = self.session.cancel().await;
                log_rejected("cancel", &res);
                let _ = reply.send(res);
            }
            UserIntent::AttachTrack { track, reply } => {
                let res = self.session.attach_track(track).await;
                log_rejected("attach track", &res);
                let _ = reply.send(res);
            }
            UserIntent::RetryMedia => {
                if self.session.has_local_media() {
                    debug!("Local media already present");
                } else {
                    self.acquire_media();
                }
            }
            UserIntent::End => self.session.end(),
        }
    }

    async fn handle_media(&mut self, result: Result<LocalStream, MediaError>) {
        self.media_pending = false;
        match result {
            Ok(stream) => {
                if let Err(e) = self.session.on_local_media(stream).await {
                    warn!("Local media not attached: {}", e);
                }
            }
            Err(e) => warn!("Local media unavailable: {}. Calls need media to start.", e),
        }
    }

    fn acquire_media(&mut self) {
        let constraints = self.session.options().media;
        if !constraints.audio && !constraints.video {
            debug!("No local media requested");
            return;
        }
        if self.media_pending {
            return;
        }
        self.media_pending = true;

        let media = self.media.clone();
        let tx = self.media_tx.clone();
        tokio::spawn(async move {
            let result = media.acquire(&constraints).await;
            // Session gone before the grant: release the devices right away.
            if let Err(mpsc::error::SendError(Ok(stream))) = tx.send(result).await {
                stream.stop();
            }
        });
    }
}

fn log_rejected(action: &str, res: &Result<(), CallError>) {
    if let Err(e) = res {
        warn!("{} rejected: {}", action, e);
    }
}
