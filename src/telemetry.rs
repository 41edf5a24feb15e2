//! Tracing setup
//!
//! `RUST_LOG` takes precedence; otherwise the configured filter is used.

use std::error::Error;

use tracing_subscriber::EnvFilter;

/// Initialize console tracing
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init()
}
