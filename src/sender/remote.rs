use super::stats::{DeliveryStats, DeliveryStatsSnapshot};
use crate::diagnostics::Diagnostics;
use crate::domain::{LogRecord, TransportError};
use crate::drain::{DrainCoordinator, InFlightGuard};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Missing API key for remote logging")]
    MissingCredential,
    #[error("Missing API url for remote logging")]
    MissingEndpoint,
    #[error("Invalid API url '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(String),
    #[error("Failed to encode record: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to send log: HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("Failed to send log: {0}")]
    Network(#[from] reqwest::Error),
}

impl From<DeliveryError> for TransportError {
    fn from(error: DeliveryError) -> Self {
        let message = error.to_string();
        match error {
            DeliveryError::MissingCredential
            | DeliveryError::MissingEndpoint
            | DeliveryError::InvalidEndpoint { .. }
            | DeliveryError::InvalidHeaderValue(_) => TransportError::Configuration(message),
            DeliveryError::Serialization(_) => TransportError::Serialization(message),
            DeliveryError::HttpStatus { .. } | DeliveryError::Network(_) => {
                TransportError::Delivery(message)
            }
        }
    }
}

/// Where and as whom remote deliveries are made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteTarget {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

impl RemoteTarget {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            api_key: Some(api_key.into()),
        }
    }
}

/// What a successful delivery looked like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub status: u16,
    pub bytes_sent: usize,
}

/// Delivers single records to the ingestion endpoint with one POST each.
///
/// Failures are final: nothing is retried, and nothing is raised to the
/// caller. Every record that passes the configuration checks is counted as
/// in flight on the shared [`DrainCoordinator`] until its request resolves.
#[derive(Clone)]
pub struct RemoteSink {
    client: Client,
    drain: Arc<DrainCoordinator>,
    stats: Arc<DeliveryStats>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl RemoteSink {
    pub fn new(
        client: Client,
        drain: Arc<DrainCoordinator>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            client,
            drain,
            stats: Arc::new(DeliveryStats::new()),
            diagnostics,
        }
    }

    /// Same sink with a different HTTP client; counters and drain are shared.
    pub fn with_client(&self, client: Client) -> Self {
        Self {
            client,
            ..self.clone()
        }
    }

    pub fn stats(&self) -> DeliveryStatsSnapshot {
        self.stats.snapshot()
    }

    /// Check configuration, encode the record and mark it in flight.
    ///
    /// Runs without suspending so the in-flight count is raised before the
    /// caller returns; the returned delivery does the network call.
    pub fn prepare(
        &self,
        record: &LogRecord,
        target: &RemoteTarget,
    ) -> Result<PendingDelivery, DeliveryError> {
        let api_key = match target.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => return Err(DeliveryError::MissingCredential),
        };
        let endpoint = match target.endpoint.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => return Err(DeliveryError::MissingEndpoint),
        };
        let url = Url::parse(endpoint).map_err(|e| DeliveryError::InvalidEndpoint {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        let headers = build_headers(api_key)?;

        let guard = self.drain.begin();
        let body = serde_json::to_vec(record)?;

        Ok(PendingDelivery {
            client: self.client.clone(),
            url,
            headers,
            body,
            stats: Arc::clone(&self.stats),
            _guard: guard,
        })
    }

    /// Deliver `record`, reporting any failure to the diagnostic channel.
    pub async fn send_remote(&self, record: &LogRecord, target: &RemoteTarget) {
        match self.prepare(record, target) {
            Ok(delivery) => delivery.send_reported(self.diagnostics.as_ref()).await,
            Err(e) => self.report_rejected(e),
        }
    }

    /// Report a delivery that never reached the network.
    pub fn report_rejected(&self, error: DeliveryError) {
        self.stats.record_skipped();
        self.diagnostics.report(&error.into());
    }

    pub fn diagnostics(&self) -> Arc<dyn Diagnostics> {
        Arc::clone(&self.diagnostics)
    }
}

impl std::fmt::Debug for RemoteSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSink")
            .field("drain", &self.drain)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

pub fn build_headers(api_key: &str) -> Result<HeaderMap, DeliveryError> {
    let mut headers = HeaderMap::new();

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut auth = HeaderValue::from_str(&format!("Basic {api_key}"))
        .map_err(|e| DeliveryError::InvalidHeaderValue(format!("Invalid API key: {e}")))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    Ok(headers)
}

/// A record that passed the checks and is counted as in flight.
///
/// The count is released when this value is dropped, whichever way the
/// request ends.
#[derive(Debug)]
pub struct PendingDelivery {
    client: Client,
    url: Url,
    headers: HeaderMap,
    body: Vec<u8>,
    stats: Arc<DeliveryStats>,
    _guard: InFlightGuard,
}

impl PendingDelivery {
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub async fn send(self) -> Result<DeliveryReceipt, DeliveryError> {
        self.deliver().await
    }

    /// Send and report a failure before the in-flight count is released.
    pub async fn send_reported(self, diagnostics: &dyn Diagnostics) {
        if let Err(e) = self.deliver().await {
            diagnostics.report(&e.into());
        }
    }

    async fn deliver(&self) -> Result<DeliveryReceipt, DeliveryError> {
        let bytes_sent = self.body.len();
        self.stats.record_attempt(bytes_sent);
        let start = Instant::now();

        let result = self.post().await;

        self.stats.record_result(result.is_ok(), start.elapsed());
        if result.is_ok() {
            debug!("Delivered log record ({} bytes) in {:?}", bytes_sent, start.elapsed());
        }
        result.map(|status| DeliveryReceipt { status, bytes_sent })
    }

    async fn post(&self) -> Result<u16, DeliveryError> {
        let response = self
            .client
            .post(self.url.clone())
            .headers(self.headers.clone())
            .body(self.body.clone())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(status.as_u16());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::HttpStatus {
            status: status.as_u16(),
            body,
        })
    }
}
