mod description;
mod event;
mod peer;
mod room;
mod signaling;

pub use description::{SdpKind, SessionDescription};
pub use event::SignalingEvent;
pub use peer::{InvalidPeerId, PeerId};
pub use room::RoomId;
pub use signaling::{ClientSignal, IceServerConfig, ServerSignal};
