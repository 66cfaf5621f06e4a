//! Shared helpers for the integration tests: tracing setup, a test
//! timeout wrapper, configuration builders and scripted executors.

pub mod builders;
pub mod fake_executor;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Set up a tracing subscriber once per test binary.
///
/// Output goes through `with_test_writer()`, so the harness captures it
/// per test and only shows it for failures (or under `-- --nocapture`).
/// Levels come from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Bound a test future to 5 seconds so a stuck event loop fails the test
/// instead of hanging the run.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("test exceeded the 5 second limit")
}
