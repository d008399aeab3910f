//! Session registry probe.
//!
//! Reads the agent's session registry and returns raw, normalized
//! entries. Classification into primary / scheduled / spawned sessions
//! is an aggregation-level rule and happens in the snapshot core, not
//! here.

use std::path::PathBuf;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;

use vigil_core::{
    Config, Probe, SectionResult, SessionRecord, SessionRegistry, SessionsReport,
};

pub struct SessionsProbe {
    path: Option<PathBuf>,
}

impl SessionsProbe {
    pub fn new(config: &Config) -> Self {
        let path = config.sessions_path.clone().or_else(|| {
            config
                .agent_home
                .as_ref()
                .map(|home| home.join("agents/main/sessions/sessions.json"))
        });
        Self { path }
    }
}

#[async_trait]
impl Probe for SessionsProbe {
    fn name(&self) -> &str {
        "sessions"
    }

    fn fallback(&self, note: &str) -> SectionResult {
        SectionResult::Sessions(SessionsReport {
            note: Some(note.to_string()),
            ..Default::default()
        })
    }

    async fn collect(&self) -> anyhow::Result<SectionResult> {
        let Some(path) = &self.path else {
            return Ok(self.fallback("no sessionsPath or agentHome configured"));
        };

        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to read sessions: {e}"))?;
        let entries = parse_registry(&raw)
            .map_err(|e| anyhow::anyhow!("failed to read sessions: {e}"))?;

        Ok(SectionResult::SessionRegistry(SessionRegistry { entries }))
    }
}

/// Parse the on-disk registry (key → session data) into normalized
/// records, preserving file order.
fn parse_registry(raw: &str) -> serde_json::Result<Vec<SessionRecord>> {
    let doc: IndexMap<String, RawSession> = serde_json::from_str(raw)?;
    Ok(doc
        .into_iter()
        .map(|(key, data)| SessionRecord {
            key,
            label: data.label.or(data.origin.and_then(|o| o.label)),
            model: data.model,
            total_tokens: data.total_tokens,
            updated_at: data.updated_at,
            aborted_last_run: data.aborted_last_run,
        })
        .collect())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSession {
    label: Option<String>,
    model: Option<String>,
    total_tokens: Option<u64>,
    updated_at: Option<i64>,
    #[serde(default)]
    aborted_last_run: bool,
    origin: Option<RawOrigin>,
}

#[derive(Deserialize)]
struct RawOrigin {
    label: Option<String>,
}
