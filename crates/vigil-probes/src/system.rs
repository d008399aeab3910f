//! Host metrics probe.
//!
//! CPU and memory come from `/proc` (plain file reads), disk from
//! `df`. Collection failures degrade to a report carrying only
//! hostname, address, and the error note.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use vigil_core::{Config, DegradedReport, Probe, SectionResult, SystemReport};

use crate::shell::sh;

const TOOL_TIMEOUT: Duration = Duration::from_secs(2);

pub struct SystemProbe {
    host_ip: String,
}

impl SystemProbe {
    pub fn new(config: &Config) -> Self {
        Self {
            host_ip: config
                .host_ip
                .clone()
                .unwrap_or_else(|| "127.0.0.1".to_string()),
        }
    }

    async fn gather(&self) -> anyhow::Result<SystemReport> {
        // Load over core count, as a rough utilization percentage.
        let loadavg = tokio::fs::read_to_string("/proc/loadavg").await?;
        let load_1m: f64 = loadavg
            .split_whitespace()
            .next()
            .ok_or_else(|| anyhow::anyhow!("empty /proc/loadavg"))?
            .parse()?;
        let nproc = sh("nproc", TOOL_TIMEOUT, &HashMap::new())
            .await
            .stdout
            .parse::<u64>()
            .unwrap_or(1)
            .max(1);
        let cpu = ((load_1m / nproc as f64) * 100.0).round().min(100.0) as u8;

        let meminfo = tokio::fs::read_to_string("/proc/meminfo").await?;
        let (memory_used, memory_total) = parse_meminfo(&meminfo);

        let df = sh("df -BG / | tail -1", TOOL_TIMEOUT, &HashMap::new()).await;
        let (disk_used, disk_total) = parse_df_line(&df.stdout);

        Ok(SystemReport {
            hostname: hostname().await,
            ip: self.host_ip.clone(),
            cpu: Some(cpu),
            memory_used: Some(memory_used),
            memory_total: Some(memory_total),
            disk_used: Some(disk_used),
            disk_total: Some(disk_total),
            error: None,
        })
    }
}

#[async_trait]
impl Probe for SystemProbe {
    fn name(&self) -> &str {
        "system"
    }

    fn fallback(&self, note: &str) -> SectionResult {
        SectionResult::Degraded(DegradedReport::new(note))
    }

    async fn collect(&self) -> anyhow::Result<SectionResult> {
        let report = match self.gather().await {
            Ok(report) => report,
            Err(err) => SystemReport {
                hostname: hostname().await,
                ip: self.host_ip.clone(),
                cpu: None,
                memory_used: None,
                memory_total: None,
                disk_used: None,
                disk_total: None,
                error: Some(err.to_string()),
            },
        };
        Ok(SectionResult::System(report))
    }
}

async fn hostname() -> String {
    tokio::fs::read_to_string("/proc/sys/kernel/hostname")
        .await
        .map(|h| h.trim().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Used/total memory in GiB, one decimal, from /proc/meminfo.
fn parse_meminfo(meminfo: &str) -> (f64, f64) {
    let field = |name: &str| -> f64 {
        Regex::new(&format!(r"{name}:\s+(\d+)"))
            .ok()
            .and_then(|re| re.captures(meminfo))
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    let total_kb = field("MemTotal");
    let available_kb = field("MemAvailable");
    (
        round1((total_kb - available_kb) / 1024.0 / 1024.0),
        round1(total_kb / 1024.0 / 1024.0),
    )
}

/// Used/total disk in GB from a `df -BG` output line.
fn parse_df_line(line: &str) -> (u64, u64) {
    let mut parts = line.split_whitespace().skip(1);
    let total = parts.next().map(parse_gigabytes).unwrap_or(0);
    let used = parts.next().map(parse_gigabytes).unwrap_or(0);
    (used, total)
}

fn parse_gigabytes(field: &str) -> u64 {
    field.trim_end_matches('G').parse().unwrap_or(0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
