//! Configuration module for ragchat
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`RAGCHAT_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use ragchat::config::RagChatConfig;
//!
//! let config = RagChatConfig::default();
//! assert_eq!(config.backend.url, "http://localhost:8000");
//!
//! let toml = r#"
//! [backend]
//! url = "http://rag-app-backend:8000"
//! "#;
//! let config: RagChatConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.backend.url, "http://rag-app-backend:8000");
//! ```

pub mod backend;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod poll;

pub use backend::BackendConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use metrics::MetricsConfig;
pub use poll::PollConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Example configuration written by `ragchat config init`.
pub const EXAMPLE_CONFIG: &str = include_str!("../../ragchat.example.toml");

/// Unified client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RagChatConfig {
    /// Backend connection settings
    pub backend: BackendConfig,
    /// Stats/document polling
    pub poll: PollConfig,
    /// Rolling metrics window
    pub metrics: MetricsConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl RagChatConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: p.to_path_buf(),
                    source,
                })?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse {
                    path: p.to_path_buf(),
                    message: e.to_string(),
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports RAGCHAT_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("RAGCHAT_BACKEND_URL") {
            self.backend.url = url;
        }
        if let Ok(timeout) = std::env::var("RAGCHAT_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.backend.request_timeout_seconds = t;
            }
        }

        if let Ok(interval) = std::env::var("RAGCHAT_POLL_INTERVAL") {
            if let Ok(i) = interval.parse() {
                self.poll.interval_seconds = i;
            }
        }
        if let Ok(window) = std::env::var("RAGCHAT_METRICS_WINDOW") {
            if let Ok(w) = window.parse() {
                self.metrics.window = w;
            }
        }

        if let Ok(level) = std::env::var("RAGCHAT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("RAGCHAT_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.backend.url.trim();
        if url.is_empty() {
            return Err(ConfigError::Validation {
                field: "backend.url".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Validation {
                field: "backend.url".to_string(),
                message: format!("URL must start with http:// or https://, got '{}'", url),
            });
        }
        if self.backend.request_timeout_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "backend.request_timeout_seconds".to_string(),
                message: "timeout must be non-zero".to_string(),
            });
        }
        if self.poll.interval_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "poll.interval_seconds".to_string(),
                message: "interval must be non-zero".to_string(),
            });
        }
        if self.metrics.window == 0 {
            return Err(ConfigError::Validation {
                field: "metrics.window".to_string(),
                message: "window must hold at least one sample".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_config_defaults() {
        let config = RagChatConfig::default();
        assert_eq!(config.backend.url, "http://localhost:8000");
        assert_eq!(config.poll.interval_seconds, 5);
        assert_eq!(config.metrics.window, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let toml = r#"
        [poll]
        interval_seconds = 10
        "#;

        let config: RagChatConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.poll.interval_seconds, 10);
        assert_eq!(config.backend.url, "http://localhost:8000");
    }

    #[test]
    fn test_config_parse_example_toml() {
        let config: RagChatConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.metrics.window, 50);
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[backend]\nurl = \"http://10.0.0.5:8000\"").unwrap();

        let config = RagChatConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.backend.url, "http://10.0.0.5:8000");
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = RagChatConfig::load(Some(Path::new("/nonexistent/ragchat.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[backend\nurl = ").unwrap();

        let result = RagChatConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_config_load_none_returns_defaults() {
        let config = RagChatConfig::load(None).unwrap();
        assert_eq!(config.backend.request_timeout_seconds, 120);
    }

    // Env var tests touch distinct variables so they can run in parallel.

    #[test]
    fn test_config_env_override_backend_url() {
        std::env::set_var("RAGCHAT_BACKEND_URL", "http://rag-app-backend:8000");
        let config = RagChatConfig::default().with_env_overrides();
        std::env::remove_var("RAGCHAT_BACKEND_URL");

        assert_eq!(config.backend.url, "http://rag-app-backend:8000");
    }

    #[test]
    fn test_config_env_invalid_value_ignored() {
        std::env::set_var("RAGCHAT_POLL_INTERVAL", "soon");
        let config = RagChatConfig::default().with_env_overrides();
        std::env::remove_var("RAGCHAT_POLL_INTERVAL");

        assert_eq!(config.poll.interval_seconds, 5);
    }

    #[test]
    fn test_config_env_override_log_format() {
        std::env::set_var("RAGCHAT_LOG_FORMAT", "json");
        let config = RagChatConfig::default().with_env_overrides();
        std::env::remove_var("RAGCHAT_LOG_FORMAT");

        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_config_validation_empty_url() {
        let mut config = RagChatConfig::default();
        config.backend.url = "  ".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "backend.url"
        ));
    }

    #[test]
    fn test_config_validation_url_scheme() {
        let mut config = RagChatConfig::default();
        config.backend.url = "localhost:8000".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "backend.url"
        ));
    }

    #[test]
    fn test_config_validation_zero_window() {
        let mut config = RagChatConfig::default();
        config.metrics.window = 0;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "metrics.window"
        ));
    }

    #[test]
    fn test_config_validation_zero_poll_interval() {
        let mut config = RagChatConfig::default();
        config.poll.interval_seconds = 0;

        assert!(config.validate().is_err());
    }
}
