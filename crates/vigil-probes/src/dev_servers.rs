//! Dev server probe.
//!
//! Scans the process table for running dev servers matching the
//! configured pattern. One entry per listen port; the project name is
//! extracted from the working path under `projectBasePath`.

use std::collections::HashMap;
use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use vigil_core::{Config, DevServerReport, Probe, SectionResult};
use vigil_core::config::DevServerConfig;

use crate::shell::sh;

const SCAN_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_GREP: &str = "next dev";
const DEFAULT_PORT: &str = "3000";

pub struct DevServersProbe {
    config: Option<DevServerConfig>,
    host_ip: String,
}

impl DevServersProbe {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.dev_servers.clone(),
            host_ip: config
                .host_ip
                .clone()
                .unwrap_or_else(|| "127.0.0.1".to_string()),
        }
    }
}

#[async_trait]
impl Probe for DevServersProbe {
    fn name(&self) -> &str {
        "devServers"
    }

    fn fallback(&self, _note: &str) -> SectionResult {
        SectionResult::DevServers(Vec::new())
    }

    async fn collect(&self) -> anyhow::Result<SectionResult> {
        let Some(config) = &self.config else {
            return Ok(SectionResult::DevServers(Vec::new()));
        };

        let grep = config.process_grep.as_deref().unwrap_or(DEFAULT_GREP);
        let base = config.project_base_path.as_deref().unwrap_or("/");

        let out = sh(
            &format!("ps aux | grep '{grep}' | grep -v grep"),
            SCAN_TIMEOUT,
            &HashMap::new(),
        )
        .await;
        if !out.ok || out.stdout.is_empty() {
            return Ok(SectionResult::DevServers(Vec::new()));
        }

        Ok(SectionResult::DevServers(parse_ps_lines(
            &out.stdout,
            base,
            &self.host_ip,
        )))
    }
}

fn parse_ps_lines(stdout: &str, base_path: &str, host_ip: &str) -> Vec<DevServerReport> {
    let port_re = Regex::new(r"--port\s+(\d+)").expect("static regex");
    let project_re = Regex::new(&format!("{}([^/]+)", regex::escape(base_path)))
        .expect("escaped base path regex");

    let mut seen_ports = HashSet::new();
    let mut servers = Vec::new();

    for line in stdout.lines().filter(|l| !l.is_empty()) {
        let mut parts = line.split_whitespace();
        let Some(pid) = parts.nth(1).and_then(|p| p.parse::<u32>().ok()) else {
            continue;
        };

        let port = port_re
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or(DEFAULT_PORT);
        if !seen_ports.insert(port.to_string()) {
            continue;
        }

        let project = project_re
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        servers.push(DevServerReport {
            project,
            status: "running".to_string(),
            url: format!("{host_ip}:{port}"),
            pid,
        });
    }

    servers
}
