use crate::error::MediaError;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "audio" => Some(TrackKind::Audio),
            "video" => Some(TrackKind::Video),
            _ => None,
        }
    }

    fn mime_type(&self) -> &'static str {
        match self {
            TrackKind::Audio => MIME_TYPE_OPUS,
            TrackKind::Video => MIME_TYPE_VP8,
        }
    }
}

impl From<RTPCodecType> for TrackKind {
    fn from(kind: RTPCodecType) -> Self {
        match kind {
            RTPCodecType::Video => TrackKind::Video,
            _ => TrackKind::Audio,
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct LocalTrackInner {
    id: String,
    stream_id: String,
    kind: TrackKind,
    sample_track: Arc<TrackLocalStaticSample>,
    stopped: AtomicBool,
}

/// A locally produced media track.
///
/// Clones share the same underlying RTP track; stopping one stops all of them.
#[derive(Clone)]
pub struct LocalTrack {
    inner: Arc<LocalTrackInner>,
}

impl LocalTrack {
    pub fn new(kind: TrackKind, id: impl Into<String>, stream_id: impl Into<String>) -> Self {
        let id = id.into();
        let stream_id = stream_id.into();
        let sample_track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: kind.mime_type().to_owned(),
                ..Default::default()
            },
            id.clone(),
            stream_id.clone(),
        ));

        Self {
            inner: Arc::new(LocalTrackInner {
                id,
                stream_id,
                kind,
                sample_track,
                stopped: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn stream_id(&self) -> &str {
        &self.inner.stream_id
    }

    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    pub fn rtc_track(&self) -> Arc<TrackLocalStaticSample> {
        self.inner.sample_track.clone()
    }

    pub async fn write_sample(&self, data: Bytes, duration: Duration) -> Result<(), MediaError> {
        if self.is_stopped() {
            return Err(MediaError::Stopped);
        }

        let sample = Sample {
            data,
            duration,
            ..Default::default()
        };
        self.inner
            .sample_track
            .write_sample(&sample)
            .await
            .map_err(MediaError::Write)
    }

    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.inner.id)
            .field("stream_id", &self.inner.stream_id)
            .field("kind", &self.inner.kind)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Tracks captured for this session. Owned by the session and stopped when it ends.
#[derive(Debug)]
pub struct LocalStream {
    pub id: String,
    pub tracks: Vec<LocalTrack>,
}

impl LocalStream {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tracks: Vec::new(),
        }
    }

    pub fn with_random_id() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn add_track(&mut self, track: LocalTrack) {
        self.tracks.push(track);
    }

    /// Creates a track of `kind` belonging to this stream.
    pub fn new_track(&mut self, kind: TrackKind) -> LocalTrack {
        let track = LocalTrack::new(kind, Uuid::new_v4().to_string(), self.id.clone());
        self.tracks.push(track.clone());
        track
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

#[derive(Clone)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: TrackKind,
    /// Present when the track came from a real peer connection.
    pub track: Option<Arc<TrackRemote>>,
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("id", &self.id)
            .field("stream_id", &self.stream_id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Remote media as reported by the connection. The session only keeps a reference for display.
#[derive(Debug, Clone)]
pub struct RemoteStream {
    pub id: String,
    pub tracks: Vec<RemoteTrack>,
}

impl RemoteStream {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tracks: Vec::new(),
        }
    }

    /// Adds a track unless one with the same id is already present.
    pub fn add_track(&mut self, track: RemoteTrack) -> bool {
        if self.tracks.iter().any(|t| t.id == track.id) {
            return false;
        }
        self.tracks.push(track);
        true
    }
}
