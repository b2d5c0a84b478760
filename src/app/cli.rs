use super::logging_system::LogLevel;
use crate::config::{ConfigError, TransportConfig};
use crate::domain::Severity;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Forward newline-delimited log records from stdin to the console and a remote endpoint.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file; environment variables and flags override it
    #[arg(long, env = "LOG_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Ingestion endpoint URL
    #[arg(long)]
    pub url: Option<String>,

    /// API credential sent as `Authorization: Basic <key>`
    #[arg(long)]
    pub api_key: Option<String>,

    /// Minimum severity to forward (name or numeric code)
    #[arg(long)]
    pub level: Option<Severity>,

    /// Disable console output
    #[arg(long)]
    pub no_console: bool,

    /// Disable remote delivery
    #[arg(long)]
    pub no_remote: bool,

    /// Disable ANSI colors on the console
    #[arg(long)]
    pub no_color: bool,

    /// How long to wait for pending deliveries before exiting
    #[arg(long, env = "LOG_DRAIN_TIMEOUT_MS", default_value = "5000")]
    pub drain_timeout_ms: u64,

    /// Verbosity of the transport's own diagnostics on stderr
    #[arg(long, env = "TRANSPORT_LOG_LEVEL", default_value = "warn")]
    pub log_level: LogLevel,
}

impl Cli {
    /// File (if any), then environment, then flags.
    pub fn transport_config(&self) -> Result<TransportConfig, ConfigError> {
        let mut config = match &self.config_file {
            Some(path) => TransportConfig::from_file(path)?,
            None => TransportConfig::default(),
        };
        config.apply_env()?;

        if let Some(url) = &self.url {
            config.url = Some(url.clone());
        }
        if let Some(api_key) = &self.api_key {
            config.api_key = Some(api_key.clone());
        }
        if let Some(level) = self.level {
            config.level = level;
        }
        if self.no_console {
            config.log_to_console = false;
        }
        if self.no_remote {
            config.log_to_remote = false;
        }
        if self.no_color {
            config.color_console = false;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}
