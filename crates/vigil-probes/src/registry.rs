//! Probe registry assembly.

use std::sync::Arc;
use std::time::Instant;

use vigil_core::{Config, Probe};

use crate::agent::AgentProbe;
use crate::containers::ContainersProbe;
use crate::dev_servers::DevServersProbe;
use crate::jobs::JobsProbe;
use crate::mail::MailProbe;
use crate::services::ServicesProbe;
use crate::sessions::SessionsProbe;
use crate::skills::SkillsProbe;
use crate::system::SystemProbe;

/// Build the fixed probe set from the config document.
///
/// Registration order here is the section order of every published
/// snapshot. Every probe is always registered — one with nothing
/// configured reports its empty shape, so the section set never varies
/// between snapshots.
pub fn registry(config: &Config, started_at: Instant) -> anyhow::Result<Vec<Arc<dyn Probe>>> {
    let client = crate::client::build(config.allow_invalid_certs)?;

    Ok(vec![
        Arc::new(AgentProbe::new(config, started_at)),
        Arc::new(MailProbe::new(config)),
        Arc::new(JobsProbe::new(config)),
        Arc::new(SessionsProbe::new(config)),
        Arc::new(ServicesProbe::new(config, client.clone())),
        Arc::new(ContainersProbe::new(config, client)),
        Arc::new(DevServersProbe::new(config)),
        Arc::new(SystemProbe::new(config)),
        Arc::new(SkillsProbe::new(config)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_section_in_order() {
        let probes = registry(&Config::default(), Instant::now()).unwrap();
        let names: Vec<&str> = probes.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            [
                "agent",
                "communication",
                "crons",
                "sessions",
                "services",
                "containers",
                "devServers",
                "system",
                "skills",
            ]
        );
    }
}
