//! Tracing initialization for binaries and integration tests.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with an env-filter, defaulting to debug output for
/// the dropgate crates. Call once at process start.
pub fn init_telemetry() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "dropgate=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}
