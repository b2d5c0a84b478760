// Internal tracing setup for the binary.
//
// Operational messages go to stderr so stdout carries only console-sink output.
use clap::ValueEnum;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Error, Debug)]
pub enum LoggingInitError {
    #[error("Invalid directive format '{input}'. Expected: 'target=level'")]
    InvalidDirectiveFormat { input: String },

    #[error("Logging system initialization failed: {details}")]
    InitFailed {
        details: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

pub struct LoggingSystem {
    directives: Arc<RwLock<Vec<String>>>,
}

impl LoggingSystem {
    pub fn new() -> Self {
        Self {
            directives: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn add_directive(&self, directive: &str) -> Result<(), LoggingInitError> {
        match directive.split_once('=') {
            Some((target, level)) if !target.is_empty() && !level.is_empty() => {
                self.directives.write().push(directive.to_string());
                Ok(())
            }
            _ => Err(LoggingInitError::InvalidDirectiveFormat {
                input: directive.to_string(),
            }),
        }
    }

    /// Keep HTTP plumbing quiet unless asked for explicitly.
    pub fn add_default_directives(&self) {
        let mut directives = self.directives.write();
        for target in ["hyper", "hyper_util", "reqwest", "h2", "rustls"] {
            directives.push(format!("{target}=warn"));
        }
    }

    pub fn build_filter_string(&self, default_level: LogLevel) -> String {
        let directives = self.directives.read();
        let mut parts = Vec::with_capacity(directives.len() + 1);
        parts.push(default_level.as_str().to_string());
        parts.extend(directives.iter().cloned());
        parts.join(",")
    }

    pub fn directive_count(&self) -> usize {
        self.directives.read().len()
    }

    pub fn initialize_tracing(&self, default_level: LogLevel) -> Result<(), LoggingInitError> {
        let filter_string = self.build_filter_string(default_level);

        let env_filter =
            EnvFilter::try_new(&filter_string).map_err(|e| LoggingInitError::InitFailed {
                details: format!("Failed to create EnvFilter with '{filter_string}'"),
                source: Box::new(e),
            })?;

        let subscriber = tracing_subscriber::registry().with(env_filter).with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .compact(),
        );

        tracing::subscriber::set_global_default(subscriber).map_err(|e| {
            LoggingInitError::InitFailed {
                details: "Failed to set global tracing subscriber".to_string(),
                source: Box::new(e),
            }
        })
    }
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new()
    }
}

pub fn setup_logging(level: LogLevel) -> Result<(), LoggingInitError> {
    let logging_system = LoggingSystem::new();
    logging_system.add_default_directives();
    logging_system.initialize_tracing(level)
}
