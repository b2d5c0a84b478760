// Lock-free delivery statistics for the remote sink.
//
// Counters only ever grow; snapshots are taken without stopping deliveries.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct DeliveryStats {
    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    bytes_sent: AtomicU64,
    total_latency_ms: AtomicU64,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// A record reached the network call.
    pub fn record_attempt(&self, bytes: usize) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// The network call finished, one way or the other.
    pub fn record_result(&self, success: bool, latency: Duration) {
        self.total_latency_ms
            .fetch_add(latency.as_millis() as u64, Ordering::Relaxed);
        if success {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// A record never reached the network because of missing configuration.
    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeliveryStatsSnapshot {
        let attempted = self.attempted.load(Ordering::Relaxed);
        let succeeded = self.succeeded.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let completed = succeeded + failed;
        let total_latency_ms = self.total_latency_ms.load(Ordering::Relaxed);

        let average_latency = if completed > 0 {
            Duration::from_millis(total_latency_ms / completed)
        } else {
            Duration::ZERO
        };

        DeliveryStatsSnapshot {
            attempted,
            succeeded,
            failed,
            skipped: self.skipped.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            average_latency,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStatsSnapshot {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
    pub bytes_sent: u64,
    pub average_latency: Duration,
}

impl DeliveryStatsSnapshot {
    /// Deliveries that reached the network but have not finished yet.
    pub fn pending(&self) -> u64 {
        self.attempted.saturating_sub(self.succeeded + self.failed)
    }
}
