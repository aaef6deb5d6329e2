pub mod loopback_hub;
pub mod session_helpers;

pub use loopback_hub::*;
pub use session_helpers::*;
