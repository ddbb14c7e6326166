//! Tracing bootstrap
//!
//! All log output of the crate goes through `tracing`. Applications call
//! [`init_tracing`] once at startup to get plain-text lines on stdout.

use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `default_directive` (e.g. `"info"` or `"info,backbone=debug"`). Returns an
/// error if a global subscriber is already installed.
pub fn init_tracing(default_directive: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_directive))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}
