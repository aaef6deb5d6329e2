mod call_session;
mod call_state;
mod handle;
mod output;

pub use call_session::{CallSession, SessionOptions, SessionSnapshot};
pub use call_state::{CallState, TerminateReason};
pub use handle::{SessionHandle, UserIntent};
pub use output::{OutboundSignal, SignalingOutput};
