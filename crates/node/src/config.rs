//! Resumption configuration.

use serde::Deserialize;
use std::time::Duration;

/// Configuration for the resumption state machine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResumptionConfig {
    /// How long to wait for an HMI response before failing the request.
    pub response_timeout_ms: u64,

    /// First correlation id handed out, and the id issuance wraps back to.
    pub first_correlation_id: u32,

    /// Largest correlation id handed out.
    pub max_correlation_id: u32,
}

impl Default for ResumptionConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: 10_000,
            first_correlation_id: 1,
            max_correlation_id: u32::MAX,
        }
    }
}

impl ResumptionConfig {
    /// Response timeout as a duration.
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Set the response timeout.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Restrict correlation ids to `first..=max`.
    pub fn with_correlation_range(mut self, first: u32, max: u32) -> Self {
        self.first_correlation_id = first;
        self.max_correlation_id = max;
        self
    }

    /// Whether the correlation range is usable.
    pub fn has_valid_correlation_range(&self) -> bool {
        self.first_correlation_id <= self.max_correlation_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResumptionConfig::default();
        assert_eq!(config.response_timeout(), Duration::from_secs(10));
        assert_eq!(config.first_correlation_id, 1);
        assert_eq!(config.max_correlation_id, u32::MAX);
        assert!(config.has_valid_correlation_range());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ResumptionConfig = toml::from_str("response_timeout_ms = 2500").unwrap();
        assert_eq!(config.response_timeout(), Duration::from_millis(2500));
        assert_eq!(config.first_correlation_id, 1);
    }

    #[test]
    fn test_builders() {
        let config = ResumptionConfig::default()
            .with_response_timeout(Duration::from_secs(3))
            .with_correlation_range(10, 5);
        assert_eq!(config.response_timeout_ms, 3000);
        assert!(!config.has_valid_correlation_range());
    }
}
