use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Upper bound for one delivery, connect through response body.
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub max_idle_connections: usize,
    pub keep_alive_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            max_idle_connections: 10,
            keep_alive_timeout: Duration::from_secs(60),
            user_agent: format!("rask-log-transport/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Build the pooled HTTP client shared by every delivery of one transport.
pub fn build_client(config: &ClientConfig) -> Result<Client, ClientError> {
    ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connection_timeout)
        .pool_max_idle_per_host(config.max_idle_connections)
        .pool_idle_timeout(config.keep_alive_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| ClientError::InvalidConfiguration(format!("Failed to build HTTP client: {e}")))
}
