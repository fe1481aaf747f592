//! Runner and configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading runner configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors reported to callers of a [`ResumptionHandle`](crate::ResumptionHandle).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunnerError {
    #[error("Resumption runner has shut down")]
    Shutdown,

    #[error("Resumption was abandoned before it finished")]
    Abandoned,
}
