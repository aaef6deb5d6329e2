use crate::engine::{EngineEvent, PeerBackend, PeerConnectionState};
use crate::error::NegotiationError;
use crate::media::{LocalTrack, RemoteTrack, TrackKind};
use async_trait::async_trait;
use duet_core::{IceServerConfig, SessionDescription};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::track::track_local::TrackLocal;

/// Upper bound on waiting for ICE candidates before handing out a description.
const GATHERING_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WebRtcBackend {
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcBackend {
    /// Builds a peer connection with default codecs and interceptors.
    /// event_tx receives track, renegotiation and connection-state notifications.
    pub async fn new(
        ice_servers: &[IceServerConfig],
        event_tx: mpsc::Sender<EngineEvent>,
    ) -> Result<Self, NegotiationError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection state changed: {:?}", s);
                    let _ = tx
                        .send(EngineEvent::ConnectionStateChanged(
                            PeerConnectionState::from(s),
                        ))
                        .await;
                })
            },
        ));

        let track_tx = event_tx.clone();
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();

            Box::pin(async move {
                let remote = RemoteTrack {
                    id: track.id(),
                    stream_id: track.stream_id(),
                    kind: TrackKind::from(track.kind()),
                    track: Some(track),
                };
                debug!("Remote {} track {} arrived", remote.kind, remote.id);
                let _ = tx.send(EngineEvent::TrackReceived(remote)).await;
            })
        }));

        let nego_tx = event_tx;
        peer_connection.on_negotiation_needed(Box::new(move || {
            let tx = nego_tx.clone();

            Box::pin(async move {
                debug!("Negotiation needed");
                let _ = tx.send(EngineEvent::RenegotiationNeeded).await;
            })
        }));

        Ok(Self { peer_connection })
    }

    /// Commits `description` locally and waits for candidate gathering, so the returned
    /// SDP carries every candidate. The signaling protocol has no separate candidate events.
    async fn commit_local(
        &self,
        description: RTCSessionDescription,
    ) -> Result<String, NegotiationError> {
        let mut gathering_complete = self.peer_connection.gathering_complete_promise().await;
        self.peer_connection
            .set_local_description(description)
            .await?;

        if tokio::time::timeout(GATHERING_TIMEOUT, gathering_complete.recv())
            .await
            .is_err()
        {
            warn!("ICE gathering did not finish in time; sending partial candidates");
        }

        let local = self.peer_connection.local_description().await.ok_or_else(|| {
            NegotiationError::InvalidState("local description missing after commit".into())
        })?;
        Ok(local.sdp)
    }
}

#[async_trait]
impl PeerBackend for WebRtcBackend {
    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError> {
        let offer = self.peer_connection.create_offer(None).await?;
        let sdp = self.commit_local(offer).await?;
        Ok(SessionDescription::offer(sdp))
    }

    async fn create_answer(
        &self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        let desc = RTCSessionDescription::offer(offer.sdp)?;
        self.peer_connection.set_remote_description(desc).await?;

        let answer = self.peer_connection.create_answer(None).await?;
        let sdp = self.commit_local(answer).await?;
        Ok(SessionDescription::answer(sdp))
    }

    async fn apply_answer(&self, answer: SessionDescription) -> Result<(), NegotiationError> {
        let desc = RTCSessionDescription::answer(answer.sdp)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), NegotiationError> {
        // webrtc-rs has no have-local-offer -> stable rollback transition; a committed
        // offer stays until it is answered or the connection is closed.
        Err(NegotiationError::RollbackUnsupported)
    }

    async fn add_track(&self, track: &LocalTrack) -> Result<(), NegotiationError> {
        let rtp_sender = self
            .peer_connection
            .add_track(track.rtc_track() as Arc<dyn TrackLocal + Send + Sync>)
            .await?;

        // RTCP must be drained for interceptors (NACK, reports) to work.
        tokio::spawn(async move {
            let mut rtcp_buf = vec![0u8; 1500];
            while let Ok((_, _)) = rtp_sender.read(&mut rtcp_buf).await {}
        });
        Ok(())
    }

    async fn close(&self) -> Result<(), NegotiationError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
