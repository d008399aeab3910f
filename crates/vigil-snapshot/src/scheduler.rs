//! Refresh scheduler — periodic background refresh with an
//! at-most-one-in-flight gate.
//!
//! Two states, IDLE and REFRESHING, held as an atomic flag. A tick that
//! lands while a cycle is in flight is dropped, never queued: probes
//! that shell out to external processes must not pile up concurrent
//! invocations when the system is slow.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::aggregator::Aggregator;
use crate::cache::SnapshotCache;

/// Drives the aggregator on a fixed period and publishes into the cache.
#[derive(Clone)]
pub struct Refresher {
    aggregator: Arc<Aggregator>,
    cache: SnapshotCache,
    period: Duration,
    in_flight: Arc<AtomicBool>,
}

impl Refresher {
    pub fn new(aggregator: Aggregator, cache: SnapshotCache, period: Duration) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            cache,
            period,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Attempt one refresh cycle.
    ///
    /// Returns `false` when another cycle is already in flight — the
    /// attempt is dropped, not queued. On success the cache entry is
    /// replaced atomically; on failure the previous entry is left
    /// untouched and the cause is logged.
    pub async fn refresh_once(&self) -> bool {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("refresh already in flight, dropping tick");
            return false;
        }

        let aggregator = Arc::clone(&self.aggregator);
        match tokio::spawn(async move { aggregator.run().await }).await {
            Ok(snapshot) => {
                self.cache.store(snapshot);
            }
            Err(err) => {
                // The previous snapshot keeps being served; a failed
                // cycle must never clear the cache.
                error!(error = %err, "refresh cycle failed, previous snapshot retained");
            }
        }

        self.in_flight.store(false, Ordering::SeqCst);
        true
    }

    /// Periodic refresh loop.
    ///
    /// The timer is independent of in-flight refreshes: each tick spawns
    /// an attempt and the gate drops it if one is still running, so a
    /// hung probe can never starve the timer. The first tick fires one
    /// period after start — the cold-start refresh is the caller's
    /// explicit `refresh_once` before serving traffic.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let start = tokio::time::Instant::now() + self.period;
        let mut interval = tokio::time::interval_at(start, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(period_ms = self.period.as_millis() as u64, "refresh loop started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let this = self.clone();
                    tokio::spawn(async move {
                        this.refresh_once().await;
                    });
                }
                _ = shutdown.changed() => {
                    debug!("refresh loop shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use vigil_core::{DegradedReport, Probe, SectionResult};

    struct SleepyProbe {
        delay: Duration,
    }

    #[async_trait]
    impl Probe for SleepyProbe {
        fn name(&self) -> &str {
            "sleepy"
        }

        fn fallback(&self, note: &str) -> SectionResult {
            SectionResult::Degraded(DegradedReport::new(note))
        }

        async fn collect(&self) -> anyhow::Result<SectionResult> {
            tokio::time::sleep(self.delay).await;
            Ok(SectionResult::Containers(Vec::new()))
        }
    }

    /// Succeeds on the first collection; afterwards panics in both
    /// `collect` and `fallback`, which kills the assembly task and
    /// fails the whole cycle.
    struct PoisonProbe {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Probe for PoisonProbe {
        fn name(&self) -> &str {
            "poison"
        }

        fn fallback(&self, _note: &str) -> SectionResult {
            panic!("fallback poisoned")
        }

        async fn collect(&self) -> anyhow::Result<SectionResult> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(SectionResult::Containers(Vec::new()))
            } else {
                panic!("collect poisoned")
            }
        }
    }

    fn refresher(probes: Vec<Arc<dyn Probe>>) -> Refresher {
        Refresher::new(
            Aggregator::new(probes),
            SnapshotCache::new(),
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn refresh_once_populates_the_cache() {
        let r = refresher(vec![Arc::new(SleepyProbe {
            delay: Duration::ZERO,
        })]);
        assert!(r.cache.load().is_none());
        assert!(r.refresh_once().await);
        let snapshot = r.cache.load().unwrap();
        assert!(snapshot.sections.contains_key("sleepy"));
    }

    #[tokio::test]
    async fn concurrent_attempt_is_dropped_not_queued() {
        let r = refresher(vec![Arc::new(SleepyProbe {
            delay: Duration::from_millis(200),
        })]);

        let first = {
            let r = r.clone();
            tokio::spawn(async move { r.refresh_once().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Second attempt lands while the first is still refreshing.
        assert!(!r.refresh_once().await);
        assert!(r.cache.load().is_none(), "dropped attempt must not publish");

        assert!(first.await.unwrap());
        assert!(r.cache.load().is_some());
    }

    #[tokio::test]
    async fn timestamp_advances_once_per_completed_cycle() {
        let r = refresher(vec![Arc::new(SleepyProbe {
            delay: Duration::ZERO,
        })]);

        r.refresh_once().await;
        let first = r.cache.load().unwrap().timestamp;
        r.refresh_once().await;
        let second = r.cache.load().unwrap().timestamp;
        assert!(second > first);
    }

    #[tokio::test]
    async fn failed_cycle_retains_previous_snapshot() {
        let r = refresher(vec![Arc::new(PoisonProbe {
            calls: AtomicUsize::new(0),
        })]);

        assert!(r.refresh_once().await);
        let before = r.cache.load().unwrap();

        // Second cycle panics through collect and fallback.
        assert!(r.refresh_once().await);
        let after = r.cache.load().unwrap();
        assert_eq!(before.timestamp, after.timestamp);

        // The gate is released even after a failed cycle.
        assert!(r.refresh_once().await);
    }

    #[tokio::test]
    async fn periodic_loop_publishes_and_stops_on_shutdown() {
        let r = refresher(vec![Arc::new(SleepyProbe {
            delay: Duration::ZERO,
        })]);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = {
            let r = r.clone();
            tokio::spawn(async move { r.run(shutdown_rx).await })
        };

        tokio::time::sleep(Duration::from_millis(180)).await;
        assert!(r.cache.load().is_some());

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
