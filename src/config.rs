//! Configuration for the transport layer.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (FANOUT_BASE_URL, FANOUT_TIMEOUT_SECONDS)
//! 2. Defaults
//!
//! The orchestrator itself owns no state, so there is no config file
//! discovery; everything the binary needs fits in a few env vars.

use serde::{Deserialize, Serialize};

/// Settings for the HTTP transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Base URL resource identifiers are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:9000/api".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("fanout/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

impl TransportConfig {
    /// Resolve configuration from environment variables over defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("FANOUT_BASE_URL") {
            config.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("FANOUT_TIMEOUT_SECONDS") {
            if let Ok(seconds) = timeout.parse() {
                config.timeout_seconds = seconds;
            }
        }

        config
    }

    /// Override the base URL (CLI flag beats environment)
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransportConfig::default();

        assert_eq!(config.base_url, "http://localhost:9000/api");
        assert_eq!(config.timeout_seconds, 30);
        assert!(config.user_agent.starts_with("fanout/"));
    }

    #[test]
    fn test_base_url_override() {
        let config = TransportConfig::default()
            .with_base_url(Some("https://example.test/api".to_string()));

        assert_eq!(config.base_url, "https://example.test/api");

        let unchanged = TransportConfig::default().with_base_url(None);
        assert_eq!(unchanged.base_url, "http://localhost:9000/api");
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: TransportConfig = serde_yaml::from_str("base_url: http://api.test").unwrap();

        assert_eq!(config.base_url, "http://api.test");
        assert_eq!(config.timeout_seconds, 30);
    }
}
