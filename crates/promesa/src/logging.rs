//! Tracing setup for test binaries.

use tracing_subscriber::EnvFilter;

/// Initialize tracing from the `PROMESA_LOG` environment variable,
/// defaulting to `warn`. Safe to call from every test; repeated calls
/// are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_env("PROMESA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
