//! Logging setup for hosts and demos

use std::sync::OnceLock;

use expose_core::{ExposeConfig, ExposeError, ExposeResult};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, reload};

static RELOAD: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Install a global fmt subscriber filtered at `level`
///
/// `RUST_LOG` takes precedence over `level` when set. Returns `false` when a global subscriber
/// is already installed; repeated calls are no-ops.
pub fn init_logging(level: &str) -> bool {
    if RELOAD.get().is_some() {
        return false;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let (filter, handle) = reload::Layer::new(filter);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true));

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }
    let _ = RELOAD.set(handle);
    true
}

/// [`init_logging`] with the level of `config`
pub fn init_logging_from_config(config: &ExposeConfig) -> bool {
    init_logging(&config.log_level)
}

/// Replace the filter installed by [`init_logging`]
pub fn set_log_level(level: &str) -> ExposeResult<()> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| ExposeError::Internal(format!("invalid log level '{level}': {e}")))?;
    let handle = RELOAD
        .get()
        .ok_or_else(|| ExposeError::Internal("logging is not initialized".to_string()))?;
    handle
        .reload(filter)
        .map_err(|e| ExposeError::Internal(format!("failed to reload filter: {e}")))
}

#[cfg(test)]
#[path = "logging/logging_tests.rs"]
mod logging_tests;
