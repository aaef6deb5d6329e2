pub mod call_tests;
pub mod engine_tests;
pub mod relay_tests;
pub mod room_tests;
pub mod termination_tests;

use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}
