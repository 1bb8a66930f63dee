pub mod builders;
pub mod recording;

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialise a test-friendly tracing subscriber once per process.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}
