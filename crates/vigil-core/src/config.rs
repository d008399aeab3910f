//! vigil.json configuration parser.
//!
//! The config document is read once at startup. Top-level options cover
//! the listener (`port`), the refresh period (`cache.ttlMs`), and one
//! block per probe category. Probe blocks are pass-through: the daemon
//! hands each one to its probe without interpreting it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3200;

fn default_ttl_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

/// The vigil.json document.
///
/// All keys are camelCase. Unknown keys are ignored so a config can be
/// shared with other tooling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Display name for the monitored agent (startup log only).
    pub name: Option<String>,
    /// Listening port. CLI `--port` takes precedence.
    pub port: Option<u16>,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Root of the agent installation; used to derive default paths for
    /// the auth profile, session registry, and cron jobs documents.
    pub agent_home: Option<PathBuf>,
    /// Agent workspace directory (heartbeat state lives under it).
    pub workspace: Option<PathBuf>,
    /// Model name reported when the heartbeat state has none.
    pub model: Option<String>,
    /// Address echoed in the system and dev-server sections.
    pub host_ip: Option<String>,
    /// Accept self-signed certificates on HTTP probes. Portainer and
    /// UniFi installations commonly present them.
    #[serde(default = "default_true")]
    pub allow_invalid_certs: bool,

    // ── Per-probe blocks (opaque pass-through) ─────────────────
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
    #[serde(default)]
    pub email: Vec<MailAccountSpec>,
    pub docker: Option<DockerConfig>,
    pub dev_servers: Option<DevServerConfig>,
    #[serde(default)]
    pub skill_dirs: Vec<PathBuf>,
    /// Overrides `{agentHome}/cron/jobs.json`.
    pub cron_jobs_path: Option<PathBuf>,
    /// Overrides `{agentHome}/agents/main/sessions/sessions.json`.
    pub sessions_path: Option<PathBuf>,
}

/// Snapshot cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Background refresh period in milliseconds.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl_ms(),
        }
    }
}

/// One entry of the `services` block.
///
/// `kind` selects the check: `"http"` (GET `url` + `healthPath`),
/// `"command"` (shell, exit status), or `"file-exists"` (credential file
/// present). An unrecognized kind is reported as status `unknown` rather
/// than rejected at parse time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: Option<String>,
    pub health_path: Option<String>,
    pub method: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub command: Option<String>,
    pub path: Option<PathBuf>,
    /// Account label echoed into the report.
    pub label: Option<String>,
    /// Per-check timeout in milliseconds.
    pub timeout: Option<u64>,
}

/// One entry of the `email` block: a shell command that prints the
/// unread count for an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailAccountSpec {
    pub name: String,
    pub address: Option<String>,
    pub command: String,
    /// Per-account timeout in milliseconds.
    pub timeout: Option<u64>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// The `docker` block: a Portainer-style container API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerConfig {
    pub url: String,
    pub endpoint_id: u64,
    pub token: String,
    /// Optional container name filter.
    pub container_filter: Option<String>,
}

/// The `devServers` block: process-table scan settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevServerConfig {
    /// Pattern grepped in `ps aux` output.
    pub process_grep: Option<String>,
    /// Base path that project directories live under.
    pub project_base_path: Option<String>,
}

impl Config {
    /// Load the config document from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Refresh period as a `Duration`. Never zero: the refresh timer
    /// requires a non-zero period.
    pub fn refresh_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.cache.ttl_ms.max(1))
    }
}
