//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Initializes the global fmt subscriber with the given filter
/// directives, falling back to `info` when they do not parse. Safe to
/// call once per process.
pub fn init(levels: &str) {
    let filter = EnvFilter::try_new(levels).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Best-effort initialization for tests, where multiple callers race and
/// the subscriber may already be set.
pub fn test_init() {
    let levels = std::env::var("TEST_LOG").unwrap_or_else(|_| "error".to_string());
    let filter = EnvFilter::try_new(&levels).unwrap_or_else(|_| EnvFilter::new("error"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
