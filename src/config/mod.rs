pub mod serde_helpers;
mod validation;

use crate::console::SkipFields;
use crate::domain::{Fields, Severity};
use crate::sender::{ClientConfig, RemoteTarget};
use serde::{Deserialize, Serialize};
use serde_helpers::{load_env_flag, load_env_string_opt, load_env_var};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Environment error: {0}")]
    EnvError(String),
}

pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_LOG_TO_CONSOLE: &str = "LOG_TO_CONSOLE";
pub const ENV_LOG_TO_REMOTE: &str = "LOG_TO_REMOTE";
pub const ENV_COLOR_CONSOLE: &str = "LOG_COLOR_CONSOLE";
pub const ENV_API_KEY: &str = "LOG_API_KEY";
pub const ENV_API_URL: &str = "LOG_API_URL";
pub const ENV_STATIC_VALUES: &str = "LOG_STATIC_VALUES";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "LOG_REQUEST_TIMEOUT_MS";

/// Snapshot of everything the transport needs to route a record.
///
/// Missing `url` or `api_key` is not a configuration error here: remote
/// delivery reports it per record and skips the network call.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Minimum severity the logger façade lets through.
    pub level: Severity,
    pub log_to_console: bool,
    pub log_to_remote: bool,
    pub color_console: bool,
    pub url: Option<String>,
    pub api_key: Option<String>,
    /// Fields merged into every record and left out of console context.
    pub static_values: Fields,
    #[serde(rename = "request_timeout_ms", with = "serde_helpers")]
    pub request_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            level: Severity::INFO,
            log_to_console: true,
            log_to_remote: true,
            color_console: true,
            url: None,
            api_key: None,
            static_values: Fields::new(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("level", &self.level)
            .field("log_to_console", &self.log_to_console)
            .field("log_to_remote", &self.log_to_remote)
            .field("color_console", &self.color_console)
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("static_values", &self.static_values)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl TransportConfig {
    pub fn with_level(mut self, level: Severity) -> Self {
        self.level = level;
        self
    }

    pub fn with_console(mut self, enabled: bool) -> Self {
        self.log_to_console = enabled;
        self
    }

    pub fn with_remote(mut self, enabled: bool) -> Self {
        self.log_to_remote = enabled;
        self
    }

    pub fn with_color(mut self, enabled: bool) -> Self {
        self.color_console = enabled;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_static_value(
        mut self,
        key: impl Into<String>,
        value: impl Into<crate::domain::FieldValue>,
    ) -> Self {
        self.static_values.insert(key, value);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load from environment variables on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields with whichever environment variables are set.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        load_env_var(ENV_LOG_LEVEL, &mut self.level)?;
        load_env_flag(ENV_LOG_TO_CONSOLE, &mut self.log_to_console)?;
        load_env_flag(ENV_LOG_TO_REMOTE, &mut self.log_to_remote)?;
        load_env_flag(ENV_COLOR_CONSOLE, &mut self.color_console)?;
        load_env_string_opt(ENV_API_URL, &mut self.url);
        load_env_string_opt(ENV_API_KEY, &mut self.api_key);

        if let Ok(raw) = std::env::var(ENV_STATIC_VALUES)
            && !raw.trim().is_empty()
        {
            self.static_values = serde_json::from_str::<Fields>(&raw).map_err(|e| {
                ConfigError::EnvError(format!(
                    "Invalid {ENV_STATIC_VALUES}: expected a JSON object ({e})"
                ))
            })?;
        }

        let mut timeout_ms = self.request_timeout.as_millis() as u64;
        load_env_var(ENV_REQUEST_TIMEOUT_MS, &mut timeout_ms)?;
        self.request_timeout = Duration::from_millis(timeout_ms);
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: TransportConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Standard field names plus the static field names.
    pub fn skip_fields(&self) -> SkipFields {
        SkipFields::with_extra(self.static_values.keys())
    }

    pub fn remote_target(&self) -> RemoteTarget {
        RemoteTarget {
            endpoint: self.url.clone(),
            api_key: self.api_key.clone(),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: self.request_timeout,
            ..ClientConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_every_output() {
        let config = TransportConfig::default();
        assert!(config.log_to_console);
        assert!(config.log_to_remote);
        assert!(config.color_console);
        assert_eq!(config.level, Severity::INFO);
        assert!(config.url.is_none());
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_skip_fields_include_static_names() {
        let config = TransportConfig::default()
            .with_static_value("service", "billing")
            .with_static_value("region", "eu-1");
        let skip = config.skip_fields();

        for name in ["level", "time", "pid", "hostname", "msg", "service", "region"] {
            assert!(skip.contains(name), "{name} should be skipped");
        }
        assert!(!skip.contains("userId"));
        assert_eq!(skip.len(), 7);
    }

    #[test]
    fn test_toml_round_trip() {
        let toml = r#"
            level = 45
            log_to_console = false
            url = "https://logs.example.com/ingest"
            api_key = "secret"
            request_timeout_ms = 2500

            [static_values]
            service = "billing"
            replica = 3
        "#;
        let config = TransportConfig::from_toml_str(toml).unwrap();

        assert_eq!(config.level, Severity::NOTIFY);
        assert!(!config.log_to_console);
        assert!(config.log_to_remote);
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(
            config.static_values.keys().collect::<Vec<_>>(),
            vec!["service", "replica"]
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = TransportConfig::default().with_api_key("super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_remote_target_and_client_config() {
        let config = TransportConfig::default()
            .with_url("https://logs.example.com")
            .with_api_key("k")
            .with_request_timeout(Duration::from_secs(3));

        assert_eq!(
            config.remote_target(),
            RemoteTarget::new("https://logs.example.com", "k")
        );
        assert_eq!(config.client_config().timeout, Duration::from_secs(3));
    }
}
