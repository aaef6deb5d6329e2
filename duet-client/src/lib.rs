pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod media;
pub mod session;
pub mod signaling;

pub use config::ClientConfig;
pub use coordinator::RoomCoordinator;
pub use engine::{
    EngineEvent, MemoryBackend, NegotiationEngine, PeerBackend, PeerConnectionState,
    WebRtcBackend,
};
pub use error::{CallError, JoinError, MediaError, NegotiationError, SignalingError};
pub use media::{
    DeniedSource, LocalStream, LocalTrack, MediaConstraints, MediaSource, RemoteStream,
    RemoteTrack, SyntheticSource, TrackKind,
};
pub use session::{
    CallSession, CallState, OutboundSignal, SessionHandle, SessionOptions, SessionSnapshot,
    SignalingOutput, TerminateReason,
};
pub use signaling::{SignalingChannel, SignalingLink, WsSignalingChannel};
