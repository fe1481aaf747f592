//! Runner configuration loaded from TOML.

use crate::ConfigError;
use resumption_node::ResumptionConfig;
use serde::Deserialize;
use std::path::Path;

/// Configuration for the resumption runner.
///
/// ```toml
/// channel_capacity = 256
/// log_filter = "resumption=debug"
///
/// [resumption]
/// response_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// State machine configuration.
    pub resumption: ResumptionConfig,

    /// Capacity of the command channel feeding the runner.
    pub channel_capacity: usize,

    /// `EnvFilter` directive for the runner's diagnostics. Applied by
    /// [`ResumptionRunner::from_config`](crate::ResumptionRunner::from_config);
    /// runners built with `new` log through the caller's default subscriber.
    pub log_filter: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            resumption: ResumptionConfig::default(),
            channel_capacity: 1024,
            log_filter: "info".to_string(),
        }
    }
}

impl RunnerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: RunnerConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Set the state machine configuration.
    pub fn with_resumption(mut self, resumption: ResumptionConfig) -> Self {
        self.resumption = resumption;
        self
    }

    /// Set the command channel capacity.
    pub fn with_channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity;
        self
    }

    /// Set the log filter.
    pub fn with_log_filter(mut self, log_filter: impl Into<String>) -> Self {
        self.log_filter = log_filter.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "channel_capacity must be positive".to_string(),
            ));
        }
        if self.resumption.response_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "response_timeout_ms must be positive".to_string(),
            ));
        }
        if !self.resumption.has_valid_correlation_range() {
            return Err(ConfigError::Invalid(format!(
                "first_correlation_id {} exceeds max_correlation_id {}",
                self.resumption.first_correlation_id, self.resumption.max_correlation_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(RunnerConfig::from_toml_str("").unwrap(), RunnerConfig::default());
    }

    #[test]
    fn test_nested_resumption_section() {
        let config = RunnerConfig::from_toml_str(
            r#"
            channel_capacity = 16
            log_filter = "debug"

            [resumption]
            response_timeout_ms = 2000
            first_correlation_id = 100
            max_correlation_id = 200
            "#,
        )
        .unwrap();

        assert_eq!(config.channel_capacity, 16);
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.resumption.response_timeout(), Duration::from_secs(2));
        assert_eq!(config.resumption.first_correlation_id, 100);
        assert_eq!(config.resumption.max_correlation_id, 200);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            RunnerConfig::from_toml_str("channel_capacity = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RunnerConfig::from_toml_str(
                "[resumption]\nfirst_correlation_id = 9\nmax_correlation_id = 3"
            ),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RunnerConfig::from_toml_str("channel_capacity = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_filter = \"warn\"").unwrap();

        let config = RunnerConfig::load(file.path()).unwrap();
        assert_eq!(config.log_filter, "warn");

        let missing = RunnerConfig::load(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
