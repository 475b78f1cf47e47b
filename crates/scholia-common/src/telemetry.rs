//! Structured logging setup shared by binaries and tests.

use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber. `RUST_LOG` wins when set;
/// otherwise scholia crates log at debug and everything else at info.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scholia=debug,info")),
        )
        .init();
}

/// Non-panicking variant for tests, where a subscriber may already be set.
pub fn try_init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scholia=debug,info")),
        )
        .try_init();
}
