//! Side channel for transport-internal failures.
//!
//! Diagnostics never go through `tracing` or the transport itself: a host
//! that routes its own logs into this transport would otherwise loop.

use crate::domain::TransportError;
use parking_lot::Mutex;
use std::io::Write;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
pub trait Diagnostics: Send + Sync {
    fn report(&self, error: &TransportError);
}

/// Writes one line per failure to the process's stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrDiagnostics;

impl Diagnostics for StderrDiagnostics {
    fn report(&self, error: &TransportError) {
        // stderr may be closed; there is nowhere left to report that
        let _ = writeln!(std::io::stderr().lock(), "rask-log-transport: {error}");
    }
}

/// Keeps reported failures in memory.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    reports: Mutex<Vec<TransportError>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<TransportError> {
        self.reports.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.reports.lock().len()
    }

    pub fn count_kind(&self, kind: &str) -> usize {
        self.reports.lock().iter().filter(|e| e.kind() == kind).count()
    }

    pub fn clear(&self) {
        self.reports.lock().clear();
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn report(&self, error: &TransportError) {
        self.reports.lock().push(error.clone());
    }
}
