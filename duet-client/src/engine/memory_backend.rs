use crate::engine::{EngineEvent, PeerBackend, PeerConnectionState};
use crate::error::NegotiationError;
use crate::media::{LocalTrack, RemoteTrack, TrackKind};
use async_trait::async_trait;
use duet_core::SessionDescription;
use std::collections::HashSet;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;
use uuid::Uuid;

const TRACK_ATTR: &str = "a=track:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalingState {
    Stable,
    HaveLocalOffer,
    Closed,
}

struct TrackLine {
    kind: TrackKind,
    stream_id: String,
    id: String,
}

struct MemoryState {
    signaling: SignalingState,
    local_tracks: Vec<TrackLine>,
    /// How many local tracks the last committed local description covered.
    described: usize,
    /// `described` as it was before the outstanding offer.
    described_before_offer: usize,
    remote_track_ids: HashSet<String>,
    connected: bool,
}

/// In-process stand-in for a peer connection.
///
/// Descriptions are plain text listing the local tracks, one `a=track:<kind> <stream> <id>`
/// line each. Applying a remote description reports tracks not seen before. Two instances
/// exchanging descriptions behave like two connected peers without any network.
pub struct MemoryBackend {
    session_id: String,
    state: Mutex<MemoryState>,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl MemoryBackend {
    pub fn new(event_tx: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            session_id: Uuid::new_v4().simple().to_string(),
            state: Mutex::new(MemoryState {
                signaling: SignalingState::Stable,
                local_tracks: Vec::new(),
                described: 0,
                described_before_offer: 0,
                remote_track_ids: HashSet::new(),
                connected: false,
            }),
            event_tx,
        }
    }

    fn emit(&self, event: EngineEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            debug!("Dropping engine event: {}", e);
        }
    }

    fn render(&self, state: &MemoryState) -> String {
        let mut sdp = format!("v=0\r\no=duet {} 0 IN IP4 127.0.0.1\r\ns=-\r\n", self.session_id);
        for track in &state.local_tracks {
            sdp.push_str(&format!(
                "{}{} {} {}\r\n",
                TRACK_ATTR,
                track.kind,
                track.stream_id,
                track.id
            ));
        }
        sdp
    }

    fn absorb_remote(&self, state: &mut MemoryState, sdp: &str) -> Result<(), NegotiationError> {
        let tracks = parse(sdp)?;
        for track in tracks {
            if state.remote_track_ids.insert(track.id.clone()) {
                self.emit(EngineEvent::TrackReceived(RemoteTrack {
                    id: track.id,
                    stream_id: track.stream_id,
                    kind: track.kind,
                    track: None,
                }));
            }
        }
        Ok(())
    }

    fn mark_connected(&self, state: &mut MemoryState) {
        if !state.connected {
            state.connected = true;
            self.emit(EngineEvent::ConnectionStateChanged(
                PeerConnectionState::Connected,
            ));
        }
    }
}

fn parse(sdp: &str) -> Result<Vec<TrackLine>, NegotiationError> {
    if !sdp.starts_with("v=0") {
        return Err(NegotiationError::InvalidDescription(
            "missing version line".into(),
        ));
    }

    let mut tracks = Vec::new();
    for line in sdp.lines() {
        let Some(attr) = line.strip_prefix(TRACK_ATTR) else {
            continue;
        };
        let mut parts = attr.split_whitespace();
        let (Some(kind), Some(stream_id), Some(id)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(NegotiationError::InvalidDescription(format!(
                "malformed track line: {line}"
            )));
        };
        let kind = TrackKind::parse(kind).ok_or_else(|| {
            NegotiationError::InvalidDescription(format!("unknown track kind: {kind}"))
        })?;
        tracks.push(TrackLine {
            kind,
            stream_id: stream_id.to_owned(),
            id: id.to_owned(),
        });
    }
    Ok(tracks)
}

#[async_trait]
impl PeerBackend for MemoryBackend {
    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError> {
        let mut state = self.state.lock().await;
        if state.signaling == SignalingState::Closed {
            return Err(NegotiationError::Closed);
        }

        if state.signaling == SignalingState::Stable {
            state.described_before_offer = state.described;
        }
        state.signaling = SignalingState::HaveLocalOffer;
        state.described = state.local_tracks.len();
        Ok(SessionDescription::offer(self.render(&state)))
    }

    async fn create_answer(
        &self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        let mut state = self.state.lock().await;
        match state.signaling {
            SignalingState::Closed => return Err(NegotiationError::Closed),
            SignalingState::HaveLocalOffer => {
                return Err(NegotiationError::InvalidState("have-local-offer".into()));
            }
            SignalingState::Stable => {}
        }

        self.absorb_remote(&mut state, &offer.sdp)?;
        state.described = state.local_tracks.len();
        let answer = SessionDescription::answer(self.render(&state));
        self.mark_connected(&mut state);
        Ok(answer)
    }

    async fn apply_answer(&self, answer: SessionDescription) -> Result<(), NegotiationError> {
        let mut state = self.state.lock().await;
        match state.signaling {
            SignalingState::Closed => return Err(NegotiationError::Closed),
            SignalingState::Stable => return Err(NegotiationError::InvalidState("stable".into())),
            SignalingState::HaveLocalOffer => {}
        }

        self.absorb_remote(&mut state, &answer.sdp)?;
        state.signaling = SignalingState::Stable;
        self.mark_connected(&mut state);

        if state.local_tracks.len() > state.described {
            self.emit(EngineEvent::RenegotiationNeeded);
        }
        Ok(())
    }

    async fn rollback(&self) -> Result<(), NegotiationError> {
        let mut state = self.state.lock().await;
        match state.signaling {
            SignalingState::Closed => Err(NegotiationError::Closed),
            SignalingState::Stable => Err(NegotiationError::InvalidState("stable".into())),
            SignalingState::HaveLocalOffer => {
                state.signaling = SignalingState::Stable;
                state.described = state.described_before_offer;
                debug!("Local offer rolled back");
                Ok(())
            }
        }
    }

    async fn add_track(&self, track: &LocalTrack) -> Result<(), NegotiationError> {
        let mut state = self.state.lock().await;
        if state.signaling == SignalingState::Closed {
            return Err(NegotiationError::Closed);
        }

        state.local_tracks.push(TrackLine {
            kind: track.kind(),
            stream_id: track.stream_id().to_owned(),
            id: track.id().to_owned(),
        });

        // Mid-offer additions are announced once the offer settles.
        if state.signaling == SignalingState::Stable {
            self.emit(EngineEvent::RenegotiationNeeded);
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), NegotiationError> {
        let mut state = self.state.lock().await;
        if state.signaling == SignalingState::Closed {
            return Ok(());
        }
        state.signaling = SignalingState::Closed;
        self.emit(EngineEvent::ConnectionStateChanged(
            PeerConnectionState::Closed,
        ));
        Ok(())
    }
}
