//! Mail accounts probe.
//!
//! Each configured account supplies a shell command that prints its
//! unread count. Accounts are checked concurrently; a failing command
//! reports the account as `error` rather than failing the section.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

use vigil_core::{
    Config, DegradedReport, MailAccountReport, MailReport, MailStatus, Probe, SectionResult,
    config::MailAccountSpec,
};

use crate::agent::normalize_epoch_ms;
use crate::shell::sh;

const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(8);

pub struct MailProbe {
    accounts: Vec<MailAccountSpec>,
    heartbeat_path: Option<PathBuf>,
}

impl MailProbe {
    pub fn new(config: &Config) -> Self {
        Self {
            accounts: config.email.clone(),
            heartbeat_path: config
                .workspace
                .as_ref()
                .map(|ws| ws.join("memory/heartbeat-state.json")),
        }
    }

    /// Timestamp of the agent's last mail check, from heartbeat state.
    async fn last_check(&self) -> Option<DateTime<Utc>> {
        let path = self.heartbeat_path.as_ref()?;
        let raw = tokio::fs::read_to_string(path).await.ok()?;
        let hb: LastChecks = serde_json::from_str(&raw).ok()?;
        let ts = hb.last_checks.get("email").copied().flatten()?;
        Utc.timestamp_millis_opt(normalize_epoch_ms(ts)).single()
    }
}

#[async_trait]
impl Probe for MailProbe {
    fn name(&self) -> &str {
        "communication"
    }

    fn fallback(&self, note: &str) -> SectionResult {
        SectionResult::Degraded(DegradedReport::new(note))
    }

    async fn collect(&self) -> anyhow::Result<SectionResult> {
        let last_check = self.last_check().await;

        let mut tasks = Vec::with_capacity(self.accounts.len());
        for account in &self.accounts {
            let account = account.clone();
            tasks.push(tokio::spawn(async move {
                check_account(&account, last_check).await
            }));
        }

        let mut email = IndexMap::with_capacity(self.accounts.len());
        for (account, task) in self.accounts.iter().zip(tasks) {
            if let Ok(report) = task.await {
                email.insert(account.name.clone(), report);
            }
        }

        Ok(SectionResult::Mail(MailReport { email }))
    }
}

async fn check_account(
    account: &MailAccountSpec,
    last_check: Option<DateTime<Utc>>,
) -> MailAccountReport {
    let timeout = account
        .timeout
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_CHECK_TIMEOUT);
    let out = sh(&account.command, timeout, &account.env).await;

    let (status, unread) = if out.ok {
        (MailStatus::Connected, parse_unread(&out.stdout))
    } else {
        (MailStatus::Error, 0)
    };

    MailAccountReport {
        status,
        unread,
        address: account.address.clone(),
        last_check,
    }
}

/// Parse an unread count from command output. Anything that is not a
/// positive number (including the literal `No results`) counts as zero.
fn parse_unread(stdout: &str) -> u64 {
    if stdout == "No results" {
        return 0;
    }
    stdout
        .split_whitespace()
        .next()
        .and_then(|tok| tok.parse().ok())
        .unwrap_or(0)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LastChecks {
    #[serde(default)]
    last_checks: HashMap<String, Option<f64>>,
}
