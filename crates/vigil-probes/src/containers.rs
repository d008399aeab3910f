//! Container state probe.
//!
//! Queries a Portainer-style endpoint for its container list. Without a
//! `docker` config block, or on any failure, the section is an empty
//! list — container state is optional decoration on the snapshot.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use vigil_core::{Config, ContainerHealth, ContainerReport, Probe, SectionResult};
use vigil_core::config::DockerConfig;

pub struct ContainersProbe {
    docker: Option<DockerConfig>,
    client: reqwest::Client,
}

impl ContainersProbe {
    pub fn new(config: &Config, client: reqwest::Client) -> Self {
        Self {
            docker: config.docker.clone(),
            client,
        }
    }
}

#[async_trait]
impl Probe for ContainersProbe {
    fn name(&self) -> &str {
        "containers"
    }

    fn fallback(&self, _note: &str) -> SectionResult {
        SectionResult::Containers(Vec::new())
    }

    async fn collect(&self) -> anyhow::Result<SectionResult> {
        let Some(docker) = &self.docker else {
            return Ok(SectionResult::Containers(Vec::new()));
        };

        let url = format!(
            "{}/api/endpoints/{}/docker/containers/json",
            docker.url, docker.endpoint_id
        );
        let mut request = self.client.get(&url).header("X-API-Key", &docker.token);
        if let Some(filter) = &docker.container_filter {
            let filters = serde_json::json!({ "name": [filter] }).to_string();
            request = request.query(&[("filters", filters)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            debug!(status = %response.status(), "container endpoint non-2xx");
            return Ok(SectionResult::Containers(Vec::new()));
        }

        let raw: Vec<RawContainer> = response.json().await?;
        Ok(SectionResult::Containers(
            raw.into_iter().map(to_report).collect(),
        ))
    }
}

fn to_report(raw: RawContainer) -> ContainerReport {
    ContainerReport {
        name: raw
            .names
            .first()
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_default(),
        status: raw.state,
        health: parse_health(&raw.status),
        uptime: raw.status.clone(),
        ports: raw
            .ports
            .into_iter()
            .filter_map(|p| p.public_port)
            .collect(),
    }
}

/// Docker status text reads like `Up 2 hours (healthy)`. The unhealthy
/// marker contains the healthy one, so it is checked first.
fn parse_health(status: &str) -> ContainerHealth {
    if status.contains("unhealthy") {
        ContainerHealth::Unhealthy
    } else if status.contains("healthy") {
        ContainerHealth::Healthy
    } else {
        ContainerHealth::None
    }
}

#[derive(Deserialize)]
struct RawContainer {
    #[serde(rename = "Names", default)]
    names: Vec<String>,
    #[serde(rename = "State", default)]
    state: String,
    #[serde(rename = "Status", default)]
    status: String,
    #[serde(rename = "Ports", default)]
    ports: Vec<RawPort>,
}

#[derive(Deserialize)]
struct RawPort {
    #[serde(rename = "PublicPort")]
    public_port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_markers() {
        assert_eq!(parse_health("Up 5 hours (healthy)"), ContainerHealth::Healthy);
        assert_eq!(
            parse_health("Up 2 hours (unhealthy)"),
            ContainerHealth::Unhealthy
        );
        assert_eq!(parse_health("Up 10 minutes"), ContainerHealth::None);
    }

    #[test]
    fn maps_the_docker_wire_shape() {
        let raw: Vec<RawContainer> = serde_json::from_str(
            r#"[{
                "Names": ["/paperless"],
                "State": "running",
                "Status": "Up 3 days (healthy)",
                "Ports": [
                    { "PublicPort": 8000 },
                    { "PrivatePort": 5432 }
                ]
            }]"#,
        )
        .unwrap();
        let report = to_report(raw.into_iter().next().unwrap());
        assert_eq!(report.name, "paperless");
        assert_eq!(report.status, "running");
        assert_eq!(report.health, ContainerHealth::Healthy);
        assert_eq!(report.uptime, "Up 3 days (healthy)");
        assert_eq!(report.ports, vec![8000]);
    }

    #[tokio::test]
    async fn without_docker_config_the_section_is_empty() {
        let client = crate::client::build(false).unwrap();
        let probe = ContainersProbe::new(&Config::default(), client);
        match probe.collect().await.unwrap() {
            SectionResult::Containers(list) => assert!(list.is_empty()),
            other => panic!("expected containers, got {other:?}"),
        }
    }
}
