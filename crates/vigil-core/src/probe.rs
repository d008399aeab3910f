//! The probe contract.
//!
//! A probe measures one signal source and reports it as a section of
//! the snapshot. Probes are constructed once at startup from their
//! config block; the registry is fixed for the process lifetime.
//!
//! Probes must be idempotent and read-only on the systems they observe.
//! They are allowed to fail or hang: the runner wraps every invocation
//! with a deadline and substitutes [`Probe::fallback`] on error, panic,
//! or timeout, so no probe failure ever crosses into the HTTP path.

use std::time::Duration;

use async_trait::async_trait;

use crate::types::SectionResult;

/// Deadline applied when a probe does not override [`Probe::timeout`].
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// One signal source, reported under a fixed section name.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Section name this probe reports under.
    fn name(&self) -> &str;

    /// Deadline for a single collection.
    fn timeout(&self) -> Duration {
        DEFAULT_PROBE_TIMEOUT
    }

    /// The section served when collection fails or times out.
    ///
    /// The shape is a property of the probe category: an empty list, a
    /// zeroed report, or a `{status: "error", note}` record.
    fn fallback(&self, note: &str) -> SectionResult;

    /// Collect the section. Runs on every refresh cycle.
    async fn collect(&self) -> anyhow::Result<SectionResult>;
}
