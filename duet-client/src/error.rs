use crate::session::CallState;
use duet_core::PeerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("peer connection is closed")]
    Closed,

    #[error("another negotiation is already in flight")]
    InProgress,

    #[error("no local offer is outstanding")]
    NoPendingOffer,

    #[error("this connection cannot roll back a local offer")]
    RollbackUnsupported,

    #[error("invalid signaling state: {0}")]
    InvalidState(String),

    #[error("invalid session description: {0}")]
    InvalidDescription(String),

    #[error(transparent)]
    Rtc(#[from] webrtc::Error),
}

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("signaling channel is closed")]
    Closed,

    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("failed to encode signal: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media access denied")]
    Denied,

    #[error("media unavailable: {0}")]
    Unavailable(String),

    #[error("track is stopped")]
    Stopped,

    #[error("failed to write sample: {0}")]
    Write(#[source] webrtc::Error),
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error("local media is not ready")]
    MediaNotReady,

    #[error("session is busy with another call")]
    BusySession,

    #[error("no remote peer in the room")]
    NoRemotePeer,

    #[error("event from unknown peer {0}")]
    UnknownPeer(PeerId),

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: CallState,
        action: &'static str,
    },

    #[error("session has ended")]
    SessionEnded,

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    #[error("signaling delivery failed: {0}")]
    SignalingDeliveryFailed(#[source] SignalingError),
}

#[derive(Debug, Error)]
pub enum JoinError {
    #[error(transparent)]
    Signaling(#[from] SignalingError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
}
