//! In-flight tracking for remote deliveries and the bounded shutdown wait.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

/// How a drain finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// No delivery was in flight when the wait returned.
    Idle,
    /// The timer won; `in_flight` deliveries were still running.
    TimedOut { in_flight: usize },
}

impl DrainOutcome {
    pub fn is_idle(&self) -> bool {
        matches!(self, DrainOutcome::Idle)
    }
}

/// Counts remote deliveries in flight and wakes drains when the count hits zero.
///
/// One coordinator belongs to one transport; independent transports never
/// share counts.
#[derive(Debug, Default)]
pub struct DrainCoordinator {
    in_flight: AtomicUsize,
    idle: Notify,
}

impl DrainCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight() == 0
    }

    /// Register one delivery. The count drops again when the guard is dropped.
    pub fn begin(self: &Arc<Self>) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        InFlightGuard {
            coordinator: Arc::clone(self),
        }
    }

    fn finish(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "in-flight counter underflow");
        if previous == 1 {
            self.idle.notify_waiters();
        }
    }

    /// Wait until no delivery is in flight, or until `max_wait` elapses.
    ///
    /// Safe to call concurrently; every caller observes the same idle
    /// transition. Deliveries still running when the timer wins keep running.
    pub async fn wait_until_idle(&self, max_wait: Duration) -> DrainOutcome {
        if self.is_idle() {
            return DrainOutcome::Idle;
        }

        debug!(
            "Draining {} in-flight deliveries (max wait {:?})",
            self.in_flight(),
            max_wait
        );

        let idle = async {
            loop {
                let notified = self.idle.notified();
                tokio::pin!(notified);
                // Register before checking so a transition between the check
                // and the await is not missed.
                notified.as_mut().enable();
                if self.is_idle() {
                    return;
                }
                notified.await;
            }
        };

        match tokio::time::timeout(max_wait, idle).await {
            Ok(()) => DrainOutcome::Idle,
            Err(_) => DrainOutcome::TimedOut {
                in_flight: self.in_flight(),
            },
        }
    }
}

/// Keeps one delivery counted as in flight for as long as it lives.
#[derive(Debug)]
#[must_use = "dropping the guard immediately ends the in-flight period"]
pub struct InFlightGuard {
    coordinator: Arc<DrainCoordinator>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.coordinator.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_idle_coordinator_returns_immediately() {
        let drain = DrainCoordinator::new();
        let start = Instant::now();
        assert_eq!(drain.wait_until_idle(Duration::from_secs(5)).await, DrainOutcome::Idle);
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_guard_releases_on_drop() {
        let drain = Arc::new(DrainCoordinator::new());
        let a = drain.begin();
        let b = drain.begin();
        assert_eq!(drain.in_flight(), 2);
        drop(a);
        assert_eq!(drain.in_flight(), 1);
        drop(b);
        assert!(drain.is_idle());
    }

    #[tokio::test]
    async fn test_guard_releases_on_panic() {
        let drain = Arc::new(DrainCoordinator::new());
        let guard = drain.begin();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("delivery blew up");
        });
        assert!(handle.await.is_err());
        assert!(drain.is_idle());
    }

    #[tokio::test]
    async fn test_wait_returns_when_last_delivery_finishes() {
        let drain = Arc::new(DrainCoordinator::new());
        let guard = drain.begin();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(guard);
        });

        let outcome = drain.wait_until_idle(Duration::from_secs(5)).await;
        assert_eq!(outcome, DrainOutcome::Idle);
        assert!(drain.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_at_boundary() {
        let drain = Arc::new(DrainCoordinator::new());
        let _guard = drain.begin();

        let start = tokio::time::Instant::now();
        let outcome = drain.wait_until_idle(Duration::from_millis(200)).await;

        assert_eq!(outcome, DrainOutcome::TimedOut { in_flight: 1 });
        assert_eq!(start.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_concurrent_drains_all_wake() {
        let drain = Arc::new(DrainCoordinator::new());
        let guard = drain.begin();

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let drain = Arc::clone(&drain);
                tokio::spawn(async move { drain.wait_until_idle(Duration::from_secs(5)).await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);

        for waiter in waiters {
            assert_eq!(waiter.await.unwrap(), DrainOutcome::Idle);
        }
    }
}
