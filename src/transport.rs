//! Fan-out dispatcher: the single entry point records come through.

use crate::config::{ConfigError, TransportConfig};
use crate::console::{ConsoleSink, SkipFields};
use crate::diagnostics::{Diagnostics, StderrDiagnostics};
use crate::domain::{Fields, LogRecord};
use crate::drain::{DrainCoordinator, DrainOutcome};
use crate::normalizer::{RecordInput, normalize};
use crate::sender::{DeliveryStatsSnapshot, RemoteSink, RemoteTarget, build_client};
use parking_lot::RwLock;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

/// Everything derived from one configuration, swapped as a unit on reload.
struct Routing {
    config: TransportConfig,
    skip: SkipFields,
    target: RemoteTarget,
    remote: RemoteSink,
}

/// Delivers records to the console and the remote endpoint.
///
/// `write` never blocks on the network and never fails: the console line is
/// written before it returns, the remote delivery runs as its own task and
/// is only tracked through the in-flight count. Call
/// [`wait_until_idle`](Self::wait_until_idle) before exiting to give pending
/// deliveries a chance to finish.
pub struct Transport {
    routing: RwLock<Arc<Routing>>,
    console: ConsoleSink,
    drain: Arc<DrainCoordinator>,
    diagnostics: Arc<dyn Diagnostics>,
    runtime: Handle,
}

impl Transport {
    /// Transport writing to stdout and reporting to stderr.
    ///
    /// Must be called from within a tokio runtime; remote deliveries are
    /// spawned onto it.
    pub fn new(config: TransportConfig) -> Result<Self, ConfigError> {
        TransportBuilder::new(config).build()
    }

    pub fn builder(config: TransportConfig) -> TransportBuilder {
        TransportBuilder::new(config)
    }

    /// Dispatch one record to every enabled sink.
    pub fn write(&self, input: impl Into<RecordInput>) {
        let routing = Arc::clone(&self.routing.read());
        let mut record = normalize(input);
        merge_static_values(&mut record, &routing.config.static_values);

        if routing.config.log_to_console {
            self.console.write_console(
                &record,
                &routing.skip,
                routing.config.color_console,
                self.diagnostics.as_ref(),
            );
        }

        if routing.config.log_to_remote {
            match routing.remote.prepare(&record, &routing.target) {
                Ok(delivery) => {
                    let diagnostics = Arc::clone(&self.diagnostics);
                    self.runtime.spawn(async move {
                        delivery.send_reported(diagnostics.as_ref()).await;
                    });
                }
                Err(e) => routing.remote.report_rejected(e),
            }
        }
    }

    /// Swap in a new configuration for records dispatched from now on.
    ///
    /// Deliveries already in flight keep the settings they started with.
    pub fn reload(&self, config: TransportConfig) -> Result<(), ConfigError> {
        let current = Arc::clone(&self.routing.read());
        let routing = Routing::derive(config, &current.remote)?;
        *self.routing.write() = Arc::new(routing);
        debug!("Transport configuration reloaded");
        Ok(())
    }

    pub fn config(&self) -> TransportConfig {
        self.routing.read().config.clone()
    }

    pub fn skip_fields(&self) -> SkipFields {
        self.routing.read().skip.clone()
    }

    /// Wait for in-flight remote deliveries, at most `max_wait`.
    pub async fn wait_until_idle(&self, max_wait: Duration) -> DrainOutcome {
        self.drain.wait_until_idle(max_wait).await
    }

    pub fn in_flight(&self) -> usize {
        self.drain.in_flight()
    }

    pub fn stats(&self) -> DeliveryStatsSnapshot {
        self.routing.read().remote.stats()
    }

    pub fn drain_coordinator(&self) -> Arc<DrainCoordinator> {
        Arc::clone(&self.drain)
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("config", &self.routing.read().config)
            .field("in_flight", &self.drain.in_flight())
            .finish_non_exhaustive()
    }
}

impl Routing {
    fn derive(config: TransportConfig, previous: &RemoteSink) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = build_client(&config.client_config())
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            skip: config.skip_fields(),
            target: config.remote_target(),
            remote: previous.with_client(client),
            config,
        })
    }
}

/// Static values come first; fields set on the record itself win.
fn merge_static_values(record: &mut LogRecord, static_values: &Fields) {
    if static_values.is_empty() {
        return;
    }
    let mut merged = static_values.clone();
    merged.merge(&record.fields);
    record.fields = merged;
}

/// Builds a [`Transport`] with non-default console writer, diagnostics or runtime.
pub struct TransportBuilder {
    config: TransportConfig,
    console: Option<ConsoleSink>,
    diagnostics: Option<Arc<dyn Diagnostics>>,
    runtime: Option<Handle>,
}

impl TransportBuilder {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            console: None,
            diagnostics: None,
            runtime: None,
        }
    }

    pub fn console_writer<W>(mut self, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        self.console = Some(ConsoleSink::new(writer));
        self
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn build(self) -> Result<Transport, ConfigError> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| {
                ConfigError::InvalidConfig(format!(
                    "Transport requires a tokio runtime for remote delivery: {e}"
                ))
            })?,
        };
        let diagnostics = self
            .diagnostics
            .unwrap_or_else(|| Arc::new(StderrDiagnostics));
        let drain = Arc::new(DrainCoordinator::new());

        self.config.validate()?;
        let client = build_client(&self.config.client_config())
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        let remote = RemoteSink::new(client, Arc::clone(&drain), Arc::clone(&diagnostics));

        let routing = Routing {
            skip: self.config.skip_fields(),
            target: self.config.remote_target(),
            remote,
            config: self.config,
        };

        Ok(Transport {
            routing: RwLock::new(Arc::new(routing)),
            console: self.console.unwrap_or_else(ConsoleSink::stdout),
            drain,
            diagnostics,
            runtime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemoryDiagnostics;
    use crate::domain::Severity;
    use std::io;

    #[derive(Clone, Default)]
    struct Buf(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl Write for Buf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    fn transport(config: TransportConfig) -> (Transport, Buf, Arc<MemoryDiagnostics>) {
        let buf = Buf::default();
        let diagnostics = Arc::new(MemoryDiagnostics::new());
        let transport = Transport::builder(config)
            .console_writer(buf.clone())
            .diagnostics(diagnostics.clone())
            .build()
            .unwrap();
        (transport, buf, diagnostics)
    }

    #[tokio::test]
    async fn test_console_only() {
        let config = TransportConfig::default().with_remote(false).with_color(false);
        let (transport, buf, diagnostics) = transport(config);

        transport.write(r#"{"level":30,"msg":"hello","userId":"u1"}"#);

        assert_eq!(buf.text(), "hello\n  userId: u1\n");
        assert_eq!(diagnostics.count(), 0);
        assert_eq!(transport.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_reports_once_and_still_writes_console() {
        let config = TransportConfig::default()
            .with_color(false)
            .with_url("http://127.0.0.1:9/ingest");
        let (transport, buf, diagnostics) = transport(config);

        transport.write(LogRecord::new(Severity::WARN, "careful"));

        assert_eq!(buf.text(), "careful\n");
        assert_eq!(diagnostics.count_kind("configuration"), 1);
        assert_eq!(transport.in_flight(), 0);
        assert_eq!(transport.stats().skipped, 1);
        assert_eq!(transport.stats().attempted, 0);
    }

    #[tokio::test]
    async fn test_static_values_are_merged_and_hidden_from_console() {
        let config = TransportConfig::default()
            .with_remote(false)
            .with_color(false)
            .with_static_value("service", "billing");
        let (transport, buf, _) = transport(config);

        transport.write(LogRecord::new(Severity::INFO, "charged").with_field("amount", 12_i64));

        assert_eq!(buf.text(), "charged\n  amount: 12\n");
    }

    #[test]
    fn test_merge_static_values_record_fields_win() {
        let statics: Fields = [("service", "billing"), ("env", "prod")].into_iter().collect();
        let mut record = LogRecord::new(Severity::INFO, "m").with_field("env", "staging");

        merge_static_values(&mut record, &statics);

        assert_eq!(record.fields.keys().collect::<Vec<_>>(), vec!["service", "env"]);
        assert_eq!(record.fields.get("env"), Some(&"staging".into()));
    }

    #[tokio::test]
    async fn test_reload_recomputes_skip_fields() {
        let (transport, buf, _) = transport(
            TransportConfig::default().with_remote(false).with_color(false),
        );
        assert!(!transport.skip_fields().contains("tenant"));

        transport
            .reload(
                TransportConfig::default()
                    .with_remote(false)
                    .with_color(false)
                    .with_static_value("tenant", "acme"),
            )
            .unwrap();

        assert!(transport.skip_fields().contains("tenant"));
        transport.write(LogRecord::new(Severity::INFO, "after"));
        assert_eq!(buf.text(), "after\n");
    }

    #[tokio::test]
    async fn test_reload_rejects_invalid_config_and_keeps_previous() {
        let (transport, _, _) = transport(TransportConfig::default().with_remote(false));

        let result = transport.reload(TransportConfig::default().with_url("ftp://x"));

        assert!(result.is_err());
        assert!(!transport.config().log_to_remote);
    }

    #[test]
    fn test_build_outside_runtime_fails() {
        let result = Transport::builder(TransportConfig::default())
            .console_writer(Buf::default())
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_everything_disabled_is_a_no_op() {
        let config = TransportConfig::default()
            .with_console(false)
            .with_remote(false);
        let (transport, buf, diagnostics) = transport(config);

        transport.write("ignored");

        assert!(buf.text().is_empty());
        assert_eq!(diagnostics.count(), 0);
    }
}
