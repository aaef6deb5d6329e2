pub mod model;
pub mod utils;

pub use model::{
    ClientSignal, IceServerConfig, InvalidPeerId, PeerId, RoomId, SdpKind, ServerSignal,
    SessionDescription, SignalingEvent,
};
