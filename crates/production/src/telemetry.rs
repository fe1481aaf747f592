//! Diagnostics sink for the runner.
//!
//! The runner logs through an injected [`Dispatch`] rather than a global
//! subscriber, so several runners (or tests) can log independently.

use crate::ConfigError;
use tracing::Dispatch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Build a formatted, filtered dispatch from an `EnvFilter` directive.
pub fn build_dispatch(filter: &str) -> Result<Dispatch, ConfigError> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|e| ConfigError::Invalid(format!("log_filter: {e}")))?;
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true));
    Ok(Dispatch::new(subscriber))
}
