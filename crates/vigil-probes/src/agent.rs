//! Agent liveness probe.
//!
//! Reads the monitored agent's heartbeat state and auth profile from
//! disk and reports heartbeat recency plus context vitals. The agent
//! writes heartbeat state on its own schedule; this probe only reads.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use vigil_core::{
    AgentReport, Config, DegradedReport, Probe, SectionResult, format_uptime,
};

/// Expected gap between agent heartbeats.
const HEARTBEAT_INTERVAL_MS: i64 = 30 * 60 * 1000;

pub struct AgentProbe {
    model: Option<String>,
    auth_profiles_path: Option<PathBuf>,
    heartbeat_path: Option<PathBuf>,
    started_at: Instant,
}

impl AgentProbe {
    pub fn new(config: &Config, started_at: Instant) -> Self {
        Self {
            model: config.model.clone(),
            auth_profiles_path: config
                .agent_home
                .as_ref()
                .map(|home| home.join("agents/main/agent/auth-profiles.json")),
            heartbeat_path: config
                .workspace
                .as_ref()
                .map(|ws| ws.join("memory/heartbeat-state.json")),
            started_at,
        }
    }
}

#[async_trait]
impl Probe for AgentProbe {
    fn name(&self) -> &str {
        "agent"
    }

    fn fallback(&self, note: &str) -> SectionResult {
        SectionResult::Degraded(DegradedReport::new(note))
    }

    async fn collect(&self) -> anyhow::Result<SectionResult> {
        let mut model = self.model.clone().unwrap_or_else(|| "unknown".to_string());

        if let Some(path) = &self.auth_profiles_path {
            if let Ok(raw) = tokio::fs::read_to_string(path).await {
                if let Ok(auth) = serde_json::from_str::<AuthProfiles>(&raw) {
                    if !auth.has_token() {
                        model = "no token".to_string();
                    }
                }
            }
        }

        let mut last_heartbeat_ms = None;
        let mut context_percent = None;
        let mut context_used = None;
        let mut context_max = None;

        if let Some(path) = &self.heartbeat_path {
            if let Ok(raw) = tokio::fs::read_to_string(path).await {
                if let Ok(hb) = serde_json::from_str::<HeartbeatState>(&raw) {
                    last_heartbeat_ms = hb.last_heartbeat_ms();
                    if let Some(vitals) = hb.vitals {
                        context_percent = vitals.context_percent;
                        context_used = vitals.context_used;
                        context_max = vitals.context_max;
                        // Vitals carry the model the agent actually runs.
                        if let Some(m) = vitals.model {
                            model = m;
                        }
                    }
                }
            }
        }

        let uptime = self.started_at.elapsed();
        Ok(SectionResult::Agent(AgentReport {
            status: "online".to_string(),
            model,
            uptime: format_uptime(uptime),
            uptime_ms: uptime.as_millis() as u64,
            last_heartbeat: last_heartbeat_ms.and_then(to_datetime),
            next_heartbeat: last_heartbeat_ms
                .map(|ms| ms + HEARTBEAT_INTERVAL_MS)
                .and_then(to_datetime),
            context_percent,
            context_used,
            context_max,
        }))
    }
}

#[derive(Deserialize)]
struct AuthProfiles {
    #[serde(default)]
    profiles: HashMap<String, AuthProfile>,
}

#[derive(Deserialize)]
struct AuthProfile {
    token: Option<String>,
}

impl AuthProfiles {
    /// Whether any profile carries a usable token.
    fn has_token(&self) -> bool {
        self.profiles
            .values()
            .any(|p| p.token.as_deref().is_some_and(|t| !t.is_empty()))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeartbeatState {
    vitals: Option<Vitals>,
    #[serde(default)]
    last_checks: HashMap<String, Option<f64>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Vitals {
    updated_at: Option<i64>,
    context_percent: Option<f64>,
    context_used: Option<u64>,
    context_max: Option<u64>,
    model: Option<String>,
}

impl HeartbeatState {
    /// Last heartbeat in epoch milliseconds: the vitals timestamp when
    /// present, otherwise the freshest check timestamp.
    fn last_heartbeat_ms(&self) -> Option<i64> {
        if let Some(ms) = self.vitals.as_ref().and_then(|v| v.updated_at) {
            return Some(ms);
        }
        self.last_checks
            .values()
            .flatten()
            .map(|ts| normalize_epoch_ms(*ts))
            .max()
    }
}

/// Heartbeat files have carried both second and millisecond epochs.
pub(crate) fn normalize_epoch_ms(ts: f64) -> i64 {
    if ts < 1e12 { (ts * 1000.0) as i64 } else { ts as i64 }
}

fn to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_seconds_to_millis() {
        assert_eq!(normalize_epoch_ms(1_700_000_000.0), 1_700_000_000_000);
        assert_eq!(normalize_epoch_ms(1_700_000_000_000.0), 1_700_000_000_000);
    }

    #[test]
    fn heartbeat_prefers_vitals_timestamp() {
        let hb: HeartbeatState = serde_json::from_str(
            r#"{
                "vitals": { "updatedAt": 1700000500000 },
                "lastChecks": { "email": 1700000000 }
            }"#,
        )
        .unwrap();
        assert_eq!(hb.last_heartbeat_ms(), Some(1_700_000_500_000));
    }

    #[test]
    fn heartbeat_falls_back_to_freshest_check() {
        let hb: HeartbeatState = serde_json::from_str(
            r#"{ "lastChecks": { "email": 1700000000, "disk": 1700000200, "skipped": null } }"#,
        )
        .unwrap();
        assert_eq!(hb.last_heartbeat_ms(), Some(1_700_000_200_000));
    }

    #[test]
    fn empty_heartbeat_state_has_no_timestamp() {
        let hb: HeartbeatState = serde_json::from_str("{}").unwrap();
        assert_eq!(hb.last_heartbeat_ms(), None);
    }

    #[test]
    fn auth_token_detection() {
        let auth: AuthProfiles = serde_json::from_str(
            r#"{ "profiles": { "main": { "token": "sk-123" }, "spare": { "token": "" } } }"#,
        )
        .unwrap();
        assert!(auth.has_token());

        let empty: AuthProfiles =
            serde_json::from_str(r#"{ "profiles": { "main": { "token": "" } } }"#).unwrap();
        assert!(!empty.has_token());

        let none: AuthProfiles = serde_json::from_str(r#"{ "profiles": {} }"#).unwrap();
        assert!(!none.has_token());
    }

    #[tokio::test]
    async fn collect_without_configured_paths_is_online_with_defaults() {
        let probe = AgentProbe::new(&Config::default(), Instant::now());
        let section = probe.collect().await.unwrap();
        match section {
            SectionResult::Agent(report) => {
                assert_eq!(report.status, "online");
                assert_eq!(report.model, "unknown");
                assert!(report.last_heartbeat.is_none());
            }
            other => panic!("expected agent report, got {other:?}"),
        }
    }
}
