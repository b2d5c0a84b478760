//! Thin logging façade over [`Transport`].
//!
//! Stamps records with time, process id and hostname, applies the minimum
//! level, carries child context, and hands every record to the transport.

use crate::config::{ConfigError, TransportConfig};
use crate::domain::{FieldValue, Fields, LogRecord, Severity};
use crate::drain::DrainOutcome;
use crate::transport::Transport;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

struct Shared {
    transport: Transport,
    level: AtomicU32,
    hostname: Option<String>,
    pid: u32,
}

/// Cheap to clone; clones and children share one transport and one level.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
    context: Arc<Fields>,
}

impl Logger {
    /// Build a logger and its transport. Must be called inside a tokio runtime.
    pub fn new(config: TransportConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_transport(Transport::new(config)?))
    }

    pub fn from_transport(transport: Transport) -> Self {
        let level = transport.config().level;
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok());
        Self {
            shared: Arc::new(Shared {
                transport,
                level: AtomicU32::new(level.code()),
                hostname,
                pid: std::process::id(),
            }),
            context: Arc::new(Fields::new()),
        }
    }

    /// A logger whose records also carry `fields`. Child values override
    /// the parent's on key collisions.
    pub fn child(&self, fields: Fields) -> Logger {
        let mut context = (*self.context).clone();
        context.merge(&fields);
        Logger {
            shared: Arc::clone(&self.shared),
            context: Arc::new(context),
        }
    }

    pub fn context(&self) -> &Fields {
        &self.context
    }

    pub fn level(&self) -> Severity {
        Severity::new(self.shared.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: Severity) {
        self.shared.level.store(level.code(), Ordering::Relaxed);
    }

    pub fn is_enabled(&self, level: Severity) -> bool {
        level >= self.level()
    }

    pub fn trace(&self, msg: impl Into<String>) {
        self.emit(Severity::TRACE, msg, None);
    }

    pub fn debug(&self, msg: impl Into<String>) {
        self.emit(Severity::DEBUG, msg, None);
    }

    pub fn info(&self, msg: impl Into<String>) {
        self.emit(Severity::INFO, msg, None);
    }

    /// Alias level of `info`.
    pub fn log(&self, msg: impl Into<String>) {
        self.emit(Severity::LOG, msg, None);
    }

    pub fn warn(&self, msg: impl Into<String>) {
        self.emit(Severity::WARN, msg, None);
    }

    /// For messages that should stand out without being errors.
    pub fn notify(&self, msg: impl Into<String>) {
        self.emit(Severity::NOTIFY, msg, None);
    }

    pub fn error(&self, msg: impl Into<String>) {
        self.emit(Severity::ERROR, msg, None);
    }

    pub fn fatal(&self, msg: impl Into<String>) {
        self.emit(Severity::FATAL, msg, None);
    }

    /// Log at `level` with call-site fields on top of the logger's context.
    pub fn log_with(&self, level: Severity, fields: &Fields, msg: impl Into<String>) {
        self.emit(level, msg, Some(fields));
    }

    /// Build the record that would be emitted, without level filtering.
    pub fn record(
        &self,
        level: Severity,
        msg: impl Into<String>,
        fields: Option<&Fields>,
    ) -> LogRecord {
        let mut record = LogRecord::new(level, msg)
            .with_time(Utc::now())
            .with_pid(self.shared.pid);
        if let Some(hostname) = &self.shared.hostname {
            record = record.with_hostname(hostname.clone());
        }
        record = extend(record, &self.context);
        if let Some(fields) = fields {
            record = extend(record, fields);
        }
        record
    }

    fn emit(&self, level: Severity, msg: impl Into<String>, fields: Option<&Fields>) {
        if !self.is_enabled(level) {
            return;
        }
        let record = self.record(level, msg, fields);
        self.shared.transport.write(record);
    }

    /// Wait for pending remote deliveries, at most `max_wait`.
    pub async fn flush(&self, max_wait: Duration) -> DrainOutcome {
        self.shared.transport.wait_until_idle(max_wait).await
    }

    /// Apply a new configuration, including its minimum level.
    pub fn reload(&self, config: TransportConfig) -> Result<(), ConfigError> {
        let level = config.level;
        self.shared.transport.reload(config)?;
        self.set_level(level);
        Ok(())
    }

    pub fn transport(&self) -> &Transport {
        &self.shared.transport
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

fn extend(mut record: LogRecord, fields: &Fields) -> LogRecord {
    for (key, value) in fields {
        record = record.with_field(key.clone(), FieldValue::clone(value));
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemoryDiagnostics;
    use std::io::{self, Write};

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
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().clone())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    fn logger(config: TransportConfig) -> (Logger, Buf) {
        let buf = Buf::default();
        let transport = Transport::builder(config.with_remote(false).with_color(false))
            .console_writer(buf.clone())
            .diagnostics(Arc::new(MemoryDiagnostics::new()))
            .build()
            .unwrap();
        (Logger::from_transport(transport), buf)
    }

    #[tokio::test]
    async fn test_level_filtering() {
        let (logger, buf) = logger(TransportConfig::default().with_level(Severity::WARN));

        logger.info("hidden");
        logger.log("hidden too");
        logger.warn("shown");
        logger.notify("also shown");

        assert_eq!(buf.lines(), vec!["shown", "also shown"]);
    }

    #[tokio::test]
    async fn test_child_context_is_rendered() {
        let (logger, buf) = logger(TransportConfig::default());
        let child = logger.child([("requestId", "r-9")].into_iter().collect());

        child.info("handled");
        logger.info("plain");

        assert_eq!(buf.lines(), vec!["handled", "  requestId: r-9", "plain"]);
    }

    #[tokio::test]
    async fn test_child_overrides_parent_context() {
        let (logger, _) = logger(TransportConfig::default());
        let parent = logger.child([("scope", "outer")].into_iter().collect());
        let child = parent.child([("scope", "inner")].into_iter().collect());

        assert_eq!(child.context().get("scope"), Some(&"inner".into()));
        assert_eq!(parent.context().get("scope"), Some(&"outer".into()));
    }

    #[tokio::test]
    async fn test_record_is_stamped() {
        let (logger, _) = logger(TransportConfig::default());
        let record = logger.record(Severity::ERROR, "boom", None);

        assert_eq!(record.level, Severity::ERROR);
        assert_eq!(record.pid, Some(std::process::id()));
        assert!(record.time.is_some());
    }

    #[tokio::test]
    async fn test_reload_applies_level() {
        let (logger, buf) = logger(TransportConfig::default());
        logger.debug("before");

        logger
            .reload(
                TransportConfig::default()
                    .with_remote(false)
                    .with_color(false)
                    .with_level(Severity::DEBUG),
            )
            .unwrap();
        logger.debug("after");

        assert_eq!(buf.lines(), vec!["after"]);
    }

    #[tokio::test]
    async fn test_flush_without_remote_is_immediate() {
        let (logger, _) = logger(TransportConfig::default());
        assert!(logger.flush(Duration::from_secs(1)).await.is_idle());
    }
}
