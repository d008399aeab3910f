//! Scheduled jobs probe.
//!
//! Reads the agent scheduler's jobs document directly — it is the
//! single source of truth for job state. Only enabled jobs are
//! reported, with the schedule rendered human-readable.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use vigil_core::{Config, JobReport, JobsReport, Probe, SectionResult};

pub struct JobsProbe {
    path: Option<PathBuf>,
}

impl JobsProbe {
    pub fn new(config: &Config) -> Self {
        let path = config.cron_jobs_path.clone().or_else(|| {
            config
                .agent_home
                .as_ref()
                .map(|home| home.join("cron/jobs.json"))
        });
        Self { path }
    }
}

#[async_trait]
impl Probe for JobsProbe {
    fn name(&self) -> &str {
        "crons"
    }

    fn fallback(&self, note: &str) -> SectionResult {
        SectionResult::Jobs(JobsReport {
            jobs: Vec::new(),
            note: Some(note.to_string()),
        })
    }

    async fn collect(&self) -> anyhow::Result<SectionResult> {
        let Some(path) = &self.path else {
            return Ok(self.fallback("no cronJobsPath or agentHome configured"));
        };

        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(_) => return Ok(self.fallback("cron jobs file not found")),
        };

        Ok(SectionResult::Jobs(build_report(&raw)?))
    }
}

fn build_report(raw: &str) -> anyhow::Result<JobsReport> {
    let doc: JobsDoc = serde_json::from_str(raw)?;
    let jobs = doc
        .jobs
        .into_iter()
        .filter(|job| job.enabled)
        .map(|job| {
            let state = job.state.unwrap_or_default();
            JobReport {
                id: job.id,
                name: job.name,
                schedule: render_schedule(job.schedule.as_ref()),
                enabled: true,
                last_status: state.last_status.unwrap_or_else(|| "unknown".to_string()),
                next_run: state.next_run_at_ms.and_then(to_datetime),
                last_run: state.last_run_at_ms.and_then(to_datetime),
            }
        })
        .collect();

    Ok(JobsReport { jobs, note: None })
}

/// Render a schedule spec human-readable: `every 30m`, `every 2h`,
/// a cron expression with optional timezone, or `at <instant>`.
fn render_schedule(schedule: Option<&RawSchedule>) -> String {
    let Some(schedule) = schedule else {
        return "unknown".to_string();
    };
    match schedule.kind.as_deref() {
        Some("every") => {
            let mins = (schedule.every_ms.unwrap_or(0) as f64 / 60_000.0).round() as u64;
            if mins >= 60 {
                format!("every {}h", (mins as f64 / 60.0).round() as u64)
            } else {
                format!("every {mins}m")
            }
        }
        Some("cron") => {
            let expr = schedule.expr.clone().unwrap_or_else(|| "unknown".to_string());
            match &schedule.tz {
                Some(tz) => format!("{expr} ({tz})"),
                None => expr,
            }
        }
        Some("at") => match schedule.at_ms.and_then(to_datetime) {
            Some(at) => format!("at {}", at.to_rfc3339()),
            None => "unknown".to_string(),
        },
        _ => "unknown".to_string(),
    }
}

fn to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

#[derive(Deserialize)]
struct JobsDoc {
    #[serde(default)]
    jobs: Vec<RawJob>,
}

#[derive(Deserialize)]
struct RawJob {
    id: String,
    name: Option<String>,
    #[serde(default)]
    enabled: bool,
    schedule: Option<RawSchedule>,
    state: Option<RawJobState>,
}

/// Schedule spec, duck-typed on `kind` like the on-disk document.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchedule {
    kind: Option<String>,
    every_ms: Option<u64>,
    expr: Option<String>,
    tz: Option<String>,
    at_ms: Option<i64>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawJobState {
    last_status: Option<String>,
    next_run_at_ms: Option<i64>,
    last_run_at_ms: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_enabled_jobs_are_reported() {
        let report = build_report(
            r#"{
                "jobs": [
                    { "id": "a", "name": "daily digest", "enabled": true,
                      "schedule": { "kind": "every", "everyMs": 1800000 },
                      "state": { "lastStatus": "ok", "lastRunAtMs": 1700000000000 } },
                    { "id": "b", "enabled": false }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(report.jobs.len(), 1);
        let job = &report.jobs[0];
        assert_eq!(job.id, "a");
        assert_eq!(job.schedule, "every 30m");
        assert_eq!(job.last_status, "ok");
        assert!(job.last_run.is_some());
        assert!(job.next_run.is_none());
    }

    #[test]
    fn interval_schedules_round_to_hours() {
        let every = |ms: u64| RawSchedule {
            kind: Some("every".to_string()),
            every_ms: Some(ms),
            expr: None,
            tz: None,
            at_ms: None,
        };
        assert_eq!(render_schedule(Some(&every(5 * 60_000))), "every 5m");
        assert_eq!(render_schedule(Some(&every(60 * 60_000))), "every 1h");
        assert_eq!(render_schedule(Some(&every(2 * 60 * 60_000))), "every 2h");
    }

    #[test]
    fn cron_schedule_includes_timezone() {
        let schedule = RawSchedule {
            kind: Some("cron".to_string()),
            every_ms: None,
            expr: Some("0 9 * * 1-5".to_string()),
            tz: Some("Europe/Berlin".to_string()),
            at_ms: None,
        };
        assert_eq!(render_schedule(Some(&schedule)), "0 9 * * 1-5 (Europe/Berlin)");
    }

    #[test]
    fn unknown_or_missing_schedule_kind() {
        assert_eq!(render_schedule(None), "unknown");
        let schedule = RawSchedule {
            kind: Some("lunar".to_string()),
            every_ms: None,
            expr: None,
            tz: None,
            at_ms: None,
        };
        assert_eq!(render_schedule(Some(&schedule)), "unknown");
    }

    #[test]
    fn missing_state_defaults_to_unknown_status() {
        let report = build_report(
            r#"{ "jobs": [ { "id": "a", "enabled": true, "schedule": { "kind": "cron", "expr": "* * * * *" } } ] }"#,
        )
        .unwrap();
        assert_eq!(report.jobs[0].last_status, "unknown");
    }

    #[tokio::test]
    async fn unconfigured_probe_reports_note() {
        let probe = JobsProbe::new(&Config::default());
        match probe.collect().await.unwrap() {
            SectionResult::Jobs(report) => {
                assert!(report.jobs.is_empty());
                assert!(report.note.unwrap().contains("no cronJobsPath"));
            }
            other => panic!("expected jobs report, got {other:?}"),
        }
    }
}
