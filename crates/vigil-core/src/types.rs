//! Section report types and the status snapshot.
//!
//! Every probe category has its own report struct; [`SectionResult`] is
//! the untagged union the aggregator assembles into a [`Snapshot`]. All
//! shapes serialize to the JSON the status endpoint publishes, so field
//! names are camelCase on the wire.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

// ── Snapshot ───────────────────────────────────────────────────────

/// One complete, atomically-published aggregation of all probe results.
///
/// Serializes flat: the `timestamp` key first, then every section under
/// its registered name in registration order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub sections: IndexMap<String, SectionResult>,
}

/// Result of a single probe, one variant per category.
///
/// `SessionRegistry` is an intermediate: the sessions probe returns raw
/// registry entries and the aggregator replaces them with a classified
/// [`SessionsReport`] before the snapshot is published.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SectionResult {
    Agent(AgentReport),
    Mail(MailReport),
    Jobs(JobsReport),
    SessionRegistry(SessionRegistry),
    Sessions(SessionsReport),
    Services(ServicesReport),
    Containers(Vec<ContainerReport>),
    DevServers(Vec<DevServerReport>),
    System(SystemReport),
    Skills(SkillsReport),
    Degraded(DegradedReport),
}

/// Generic degraded shape for categories without a structured fallback.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DegradedReport {
    /// Always `"error"`.
    pub status: String,
    pub note: String,
}

impl DegradedReport {
    pub fn new(note: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            note: note.into(),
        }
    }
}

// ── Agent ──────────────────────────────────────────────────────────

/// Agent liveness: heartbeat recency and context vitals.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentReport {
    pub status: String,
    pub model: String,
    pub uptime: String,
    pub uptime_ms: u64,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub next_heartbeat: Option<DateTime<Utc>>,
    pub context_percent: Option<f64>,
    pub context_used: Option<u64>,
    pub context_max: Option<u64>,
}

// ── Communication ──────────────────────────────────────────────────

/// Mail accounts keyed by account name.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MailReport {
    pub email: IndexMap<String, MailAccountReport>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MailAccountReport {
    pub status: MailStatus,
    pub unread: u64,
    pub address: Option<String>,
    pub last_check: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailStatus {
    Connected,
    Error,
}

// ── Background jobs ────────────────────────────────────────────────

/// Enabled scheduled jobs with a human-readable schedule.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct JobsReport {
    pub jobs: Vec<JobReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobReport {
    pub id: String,
    pub name: Option<String>,
    pub schedule: String,
    pub enabled: bool,
    pub last_status: String,
    pub next_run: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
}

// ── Sessions ───────────────────────────────────────────────────────

/// Raw session registry entries, as read from disk. Never published:
/// the aggregator classifies these into a [`SessionsReport`].
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SessionRegistry {
    pub entries: Vec<SessionRecord>,
}

/// One normalized registry entry.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub key: String,
    pub label: Option<String>,
    pub model: Option<String>,
    pub total_tokens: Option<u64>,
    /// Epoch milliseconds of the last update, if recorded.
    pub updated_at: Option<i64>,
    pub aborted_last_run: bool,
}

/// Classified session counts plus the spawned sub-task list, sorted by
/// most-recent update (entries with no timestamp last).
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SessionsReport {
    pub total: usize,
    pub main: usize,
    pub cron: usize,
    pub spawn: usize,
    pub spawns: Vec<SpawnReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpawnReport {
    pub key: String,
    pub label: String,
    pub model: String,
    pub tokens: u64,
    pub updated_at: Option<DateTime<Utc>>,
    /// `"running"`, or `"aborted"` when the last run was aborted.
    pub status: String,
}

// ── Services ───────────────────────────────────────────────────────

/// Service checks keyed by service name, with a synthetic `_summary`
/// entry appended by the aggregator.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ServicesReport {
    #[serde(flatten)]
    pub entries: IndexMap<String, ServiceReport>,
    #[serde(rename = "_summary", skip_serializing_if = "Option::is_none")]
    pub summary: Option<ServiceSummary>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServiceReport {
    pub status: ServiceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceReport {
    pub fn new(status: ServiceStatus) -> Self {
        Self {
            status,
            url: None,
            account: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Reachable,
    Unreachable,
    Authenticated,
    Error,
    #[serde(rename = "not configured")]
    NotConfigured,
    Unknown,
}

impl ServiceStatus {
    /// Whether this status counts as online in the services summary.
    pub fn is_online(self) -> bool {
        matches!(self, ServiceStatus::Reachable | ServiceStatus::Authenticated)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ServiceSummary {
    pub online: usize,
    pub total: usize,
}

// ── Containers ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContainerReport {
    pub name: String,
    pub status: String,
    pub health: ContainerHealth,
    pub uptime: String,
    pub ports: Vec<u16>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContainerHealth {
    Healthy,
    Unhealthy,
    None,
}

// ── Dev servers ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DevServerReport {
    pub project: String,
    pub status: String,
    pub url: String,
    pub pid: u32,
}

// ── System ─────────────────────────────────────────────────────────

/// Local host metrics. On collection failure only `hostname`, `ip`,
/// and `error` are populated.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemReport {
    pub hostname: String,
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_used: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ── Skills ─────────────────────────────────────────────────────────

/// Installed skill inventory with binary availability.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SkillsReport {
    pub total: usize,
    pub available: usize,
    pub skills: Vec<SkillReport>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkillReport {
    pub name: String,
    pub description: String,
    pub required_bins: Vec<String>,
    pub available: bool,
    pub custom: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn snapshot_serializes_flat_in_registration_order() {
        let mut sections = IndexMap::new();
        sections.insert(
            "containers".to_string(),
            SectionResult::Containers(Vec::new()),
        );
        sections.insert(
            "system".to_string(),
            SectionResult::Degraded(DegradedReport::new("timed out")),
        );
        let snapshot = Snapshot {
            timestamp: Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap(),
            sections,
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        let obj = json.as_object().unwrap();
        let keys: Vec<&String> = obj.keys().collect();
        assert_eq!(keys, ["timestamp", "containers", "system"]);
        assert_eq!(json["system"]["status"], "error");
        assert_eq!(json["system"]["note"], "timed out");
    }

    #[test]
    fn service_status_wire_names() {
        assert_eq!(
            serde_json::to_value(ServiceStatus::Reachable).unwrap(),
            "reachable"
        );
        assert_eq!(
            serde_json::to_value(ServiceStatus::NotConfigured).unwrap(),
            "not configured"
        );
    }

    #[test]
    fn service_status_online() {
        assert!(ServiceStatus::Reachable.is_online());
        assert!(ServiceStatus::Authenticated.is_online());
        assert!(!ServiceStatus::Unreachable.is_online());
        assert!(!ServiceStatus::Error.is_online());
    }

    #[test]
    fn services_report_flattens_with_summary_last() {
        let mut report = ServicesReport::default();
        report.entries.insert(
            "github".to_string(),
            ServiceReport::new(ServiceStatus::Authenticated),
        );
        report.summary = Some(ServiceSummary { online: 1, total: 1 });

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["github"]["status"], "authenticated");
        assert_eq!(json["_summary"]["online"], 1);
        assert_eq!(json["_summary"]["total"], 1);
    }

    #[test]
    fn optional_note_omitted_when_absent() {
        let report = JobsReport::default();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("note").is_none());
        assert!(json["jobs"].as_array().unwrap().is_empty());
    }

    #[test]
    fn agent_report_nulls_are_explicit() {
        let report = AgentReport {
            status: "online".to_string(),
            model: "unknown".to_string(),
            uptime: "0m".to_string(),
            uptime_ms: 0,
            last_heartbeat: None,
            next_heartbeat: None,
            context_percent: None,
            context_used: None,
            context_max: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        // Heartbeat fields serialize as null, not as missing keys.
        assert!(json["lastHeartbeat"].is_null());
        assert!(json.as_object().unwrap().contains_key("lastHeartbeat"));
        assert_eq!(json["uptimeMs"], 0);
    }
}
