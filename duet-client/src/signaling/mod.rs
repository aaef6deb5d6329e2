mod channel;
mod ws_channel;

pub use channel::{SignalingChannel, SignalingLink};
pub use ws_channel::WsSignalingChannel;
