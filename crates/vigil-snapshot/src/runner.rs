//! Probe runner — executes one probe under its deadline.
//!
//! The runner is the failure boundary around every probe: errors,
//! panics, and timeouts all reduce to the probe's fallback section, so
//! nothing a probe does can fail the aggregation.

use std::sync::Arc;

use tracing::warn;

use vigil_core::{Probe, SectionResult};

/// Run one probe to a `SectionResult`, never propagating failure.
///
/// The probe runs on its own task so a panic stays contained, wrapped
/// in `tokio::time::timeout` so a probe that never settles cannot hold
/// up the refresh cycle. A timed-out task is abandoned, not awaited;
/// subprocess-spawning probes reap their children via `kill_on_drop`.
pub async fn run_probe(probe: Arc<dyn Probe>) -> SectionResult {
    let deadline = probe.timeout();
    let task = {
        let probe = Arc::clone(&probe);
        tokio::spawn(async move { probe.collect().await })
    };

    match tokio::time::timeout(deadline, task).await {
        Ok(Ok(Ok(section))) => section,
        Ok(Ok(Err(err))) => {
            warn!(probe = probe.name(), error = %err, "probe failed, serving fallback");
            probe.fallback(&err.to_string())
        }
        Ok(Err(join_err)) => {
            warn!(probe = probe.name(), error = %join_err, "probe panicked, serving fallback");
            probe.fallback("probe panicked")
        }
        Err(_) => {
            warn!(
                probe = probe.name(),
                timeout_ms = deadline.as_millis() as u64,
                "probe timed out, serving fallback"
            );
            probe.fallback("timed out")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use vigil_core::DegradedReport;

    enum Behavior {
        Ok,
        Fail,
        Panic,
        Hang,
    }

    struct StubProbe {
        behavior: Behavior,
        timeout: Duration,
    }

    impl StubProbe {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                timeout: Duration::from_millis(100),
            })
        }
    }

    #[async_trait]
    impl Probe for StubProbe {
        fn name(&self) -> &str {
            "stub"
        }

        fn timeout(&self) -> Duration {
            self.timeout
        }

        fn fallback(&self, note: &str) -> SectionResult {
            SectionResult::Degraded(DegradedReport::new(note))
        }

        async fn collect(&self) -> anyhow::Result<SectionResult> {
            match self.behavior {
                Behavior::Ok => Ok(SectionResult::Containers(Vec::new())),
                Behavior::Fail => Err(anyhow::anyhow!("backend unreachable")),
                Behavior::Panic => panic!("probe bug"),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!()
                }
            }
        }
    }

    #[tokio::test]
    async fn success_passes_the_section_through() {
        let section = run_probe(StubProbe::new(Behavior::Ok)).await;
        assert_eq!(section, SectionResult::Containers(Vec::new()));
    }

    #[tokio::test]
    async fn error_becomes_fallback_with_cause() {
        let section = run_probe(StubProbe::new(Behavior::Fail)).await;
        match section {
            SectionResult::Degraded(report) => {
                assert_eq!(report.status, "error");
                assert!(report.note.contains("backend unreachable"));
            }
            other => panic!("expected degraded section, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn panic_is_contained() {
        let section = run_probe(StubProbe::new(Behavior::Panic)).await;
        match section {
            SectionResult::Degraded(report) => assert!(report.note.contains("panicked")),
            other => panic!("expected degraded section, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn hung_probe_returns_within_deadline_plus_overhead() {
        let start = Instant::now();
        let section = run_probe(StubProbe::new(Behavior::Hang)).await;
        let elapsed = start.elapsed();

        match section {
            SectionResult::Degraded(report) => assert!(report.note.contains("timed out")),
            other => panic!("expected degraded section, got {other:?}"),
        }
        // 100ms deadline, generous scheduling allowance.
        assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    }
}
