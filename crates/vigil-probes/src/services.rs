//! Service reachability probe.
//!
//! Three check kinds per configured service: an HTTP GET against a
//! health path, a shell command judged by exit status, or a credential
//! file presence test. Checks run concurrently; each reduces to a
//! status the aggregator can count in the `_summary` entry.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::debug;

use vigil_core::{
    Config, Probe, SectionResult, ServiceReport, ServiceStatus, ServicesReport,
    config::ServiceSpec,
};

use crate::shell::sh;

const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ServicesProbe {
    services: Vec<ServiceSpec>,
    client: reqwest::Client,
}

impl ServicesProbe {
    pub fn new(config: &Config, client: reqwest::Client) -> Self {
        Self {
            services: config.services.clone(),
            client,
        }
    }
}

#[async_trait]
impl Probe for ServicesProbe {
    fn name(&self) -> &str {
        "services"
    }

    fn fallback(&self, _note: &str) -> SectionResult {
        SectionResult::Services(ServicesReport::default())
    }

    async fn collect(&self) -> anyhow::Result<SectionResult> {
        let mut tasks = Vec::with_capacity(self.services.len());
        for spec in &self.services {
            let spec = spec.clone();
            let client = self.client.clone();
            tasks.push(tokio::spawn(
                async move { check_service(&spec, &client).await },
            ));
        }

        let mut entries = IndexMap::with_capacity(self.services.len());
        for (spec, task) in self.services.iter().zip(tasks) {
            if let Ok(report) = task.await {
                entries.insert(spec.name.clone(), report);
            }
        }

        // The `_summary` entry is appended by the aggregator.
        Ok(SectionResult::Services(ServicesReport {
            entries,
            summary: None,
        }))
    }
}

async fn check_service(spec: &ServiceSpec, client: &reqwest::Client) -> ServiceReport {
    let mut report = match spec.kind.as_str() {
        "http" => check_http(spec, client).await,
        "command" => check_command(spec).await,
        "file-exists" => check_file_exists(spec).await,
        other => {
            let mut report = ServiceReport::new(ServiceStatus::Unknown);
            report.error = Some(format!("Unknown type: {other}"));
            report
        }
    };
    report.account = spec.label.clone();
    report
}

async fn check_http(spec: &ServiceSpec, client: &reqwest::Client) -> ServiceReport {
    let base = spec.url.clone().unwrap_or_default();
    let url = format!("{base}{}", spec.health_path.as_deref().unwrap_or(""));
    let method = spec
        .method
        .as_deref()
        .and_then(|m| reqwest::Method::from_bytes(m.as_bytes()).ok())
        .unwrap_or(reqwest::Method::GET);

    let mut request = client.request(method, &url);
    for (key, value) in &spec.headers {
        request = request.header(key, value);
    }
    if let Some(body) = &spec.body {
        request = request.body(body.clone());
    }

    let status = match request.send().await {
        Ok(response) if response.status().is_success() => ServiceStatus::Reachable,
        Ok(response) => {
            debug!(service = %spec.name, status = %response.status(), "health check non-2xx");
            ServiceStatus::Unreachable
        }
        Err(err) => {
            debug!(service = %spec.name, error = %err, "health check failed");
            ServiceStatus::Unreachable
        }
    };

    let mut report = ServiceReport::new(status);
    report.url = Some(strip_scheme(&base).to_string());
    report
}

async fn check_command(spec: &ServiceSpec) -> ServiceReport {
    let Some(command) = &spec.command else {
        let mut report = ServiceReport::new(ServiceStatus::Error);
        report.error = Some("no command configured".to_string());
        return report;
    };
    let timeout = spec
        .timeout
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_COMMAND_TIMEOUT);

    let out = sh(&format!("{command} 2>&1"), timeout, &HashMap::new()).await;
    ServiceReport::new(if out.ok {
        ServiceStatus::Authenticated
    } else {
        ServiceStatus::Error
    })
}

/// A credential file counts as configured when its listing mentions a
/// token or is non-trivial in size.
async fn check_file_exists(spec: &ServiceSpec) -> ServiceReport {
    let Some(path) = &spec.path else {
        return ServiceReport::new(ServiceStatus::NotConfigured);
    };
    if tokio::fs::metadata(path).await.is_err() {
        return ServiceReport::new(ServiceStatus::NotConfigured);
    }

    let out = sh(
        &format!("ls {} 2>/dev/null", path.display()),
        Duration::from_secs(2),
        &HashMap::new(),
    )
    .await;
    let configured = out.ok && (out.stdout.contains("token") || out.stdout.len() > 10);
    ServiceReport::new(if configured {
        ServiceStatus::Authenticated
    } else {
        ServiceStatus::NotConfigured
    })
}

fn strip_scheme(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}
