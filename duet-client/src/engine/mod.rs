mod backend;
mod engine_event;
mod memory_backend;
mod negotiation_engine;
mod webrtc_backend;

pub use backend::PeerBackend;
pub use engine_event::{EngineEvent, PeerConnectionState};
pub use memory_backend::MemoryBackend;
pub use negotiation_engine::NegotiationEngine;
pub use webrtc_backend::WebRtcBackend;
