//! Snapshot aggregator — concurrent fan-out over the probe registry.
//!
//! Runs every registered probe through the runner, joins all results,
//! and assembles them into a snapshot keyed by section name in
//! registration order. The two post-processing rules that combine
//! registry or cross-entry state (session classification, services
//! summary) live here rather than in the probes.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use indexmap::IndexMap;
use tokio::task::JoinSet;
use tracing::debug;

use vigil_core::{
    Probe, SectionResult, ServiceSummary, SessionRecord, SessionsReport, Snapshot, SpawnReport,
};

use crate::runner::run_probe;

/// Fans probes out concurrently and merges their sections.
pub struct Aggregator {
    probes: Vec<Arc<dyn Probe>>,
}

impl Aggregator {
    /// Build over the fixed probe registry. Section order in every
    /// snapshot follows the order of `probes`.
    pub fn new(probes: Vec<Arc<dyn Probe>>) -> Self {
        Self { probes }
    }

    /// Run every registered probe concurrently and assemble a snapshot.
    ///
    /// Join semantics: waits for all probes to settle. No probe can fail
    /// the aggregation — the runner reduces each failure to its fallback
    /// section, so the snapshot always contains every registered section.
    pub async fn run(&self) -> Snapshot {
        let mut set = JoinSet::new();
        for (index, probe) in self.probes.iter().enumerate() {
            let probe = Arc::clone(probe);
            set.spawn(async move { (index, run_probe(probe).await) });
        }

        let mut slots: Vec<Option<SectionResult>> = vec![None; self.probes.len()];
        while let Some(joined) = set.join_next().await {
            if let Ok((index, section)) = joined {
                slots[index] = Some(section);
            }
        }

        let mut sections = IndexMap::with_capacity(self.probes.len());
        for (probe, slot) in self.probes.iter().zip(slots) {
            let section = slot.unwrap_or_else(|| probe.fallback("probe task lost"));
            sections.insert(probe.name().to_string(), section);
        }

        post_process(&mut sections);

        debug!(sections = sections.len(), "snapshot assembled");
        Snapshot {
            timestamp: Utc::now(),
            sections,
        }
    }
}

/// Aggregation-level post-processing over the assembled sections.
fn post_process(sections: &mut IndexMap<String, SectionResult>) {
    for section in sections.values_mut() {
        if let SectionResult::SessionRegistry(registry) = section {
            let entries = std::mem::take(&mut registry.entries);
            *section = SectionResult::Sessions(classify_sessions(entries));
        } else if let SectionResult::Services(report) = section {
            let online = report
                .entries
                .values()
                .filter(|entry| entry.status.is_online())
                .count();
            report.summary = Some(ServiceSummary {
                online,
                total: report.entries.len(),
            });
        }
    }
}

/// Classify raw registry entries into primary sessions, scheduled-job
/// sessions, and spawned sub-tasks.
///
/// Key-pattern precedence: a spawned/subagent pattern wins over the
/// cron pattern, which wins over the primary-session suffix. Spawned
/// entries are sorted most-recently-updated first, missing timestamps
/// last.
fn classify_sessions(entries: Vec<SessionRecord>) -> SessionsReport {
    let mut report = SessionsReport {
        total: entries.len(),
        ..Default::default()
    };

    for record in entries {
        if is_spawn_key(&record.key) {
            report.spawn += 1;
            report.spawns.push(SpawnReport {
                label: record
                    .label
                    .unwrap_or_else(|| "Unknown Task".to_string()),
                model: record.model.unwrap_or_else(|| "unknown".to_string()),
                tokens: record.total_tokens.unwrap_or(0),
                updated_at: record
                    .updated_at
                    .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
                status: if record.aborted_last_run {
                    "aborted".to_string()
                } else {
                    "running".to_string()
                },
                key: record.key,
            });
        } else if record.key.contains(":cron:") {
            report.cron += 1;
        } else if record.key.ends_with(":main") {
            report.main += 1;
        }
    }

    // `None < Some(_)`, so descending order puts missing timestamps last.
    report.spawns.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    report
}

fn is_spawn_key(key: &str) -> bool {
    key.contains(":spawn:") || key.contains(":subagent:") || key.starts_with("spawn:")
}
