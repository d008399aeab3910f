//! Installed skills probe.
//!
//! Scans each configured skill directory for subdirectories carrying a
//! `SKILL.md`, pulls the description and required binaries out of the
//! frontmatter, and checks that the binaries resolve on PATH.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use vigil_core::{Config, Probe, SectionResult, SkillReport, SkillsReport};

use crate::shell::sh;

const WHICH_TIMEOUT: Duration = Duration::from_secs(2);
/// Frontmatter lives at the top; reading more is wasted work.
const HEAD_CHARS: usize = 2000;

pub struct SkillsProbe {
    dirs: Vec<PathBuf>,
}

impl SkillsProbe {
    pub fn new(config: &Config) -> Self {
        Self {
            dirs: config.skill_dirs.clone(),
        }
    }
}

#[async_trait]
impl Probe for SkillsProbe {
    fn name(&self) -> &str {
        "skills"
    }

    fn timeout(&self) -> Duration {
        // Many skills × `which` lookups; give the scan extra room.
        Duration::from_secs(15)
    }

    fn fallback(&self, _note: &str) -> SectionResult {
        SectionResult::Skills(SkillsReport::default())
    }

    async fn collect(&self) -> anyhow::Result<SectionResult> {
        let mut skills = Vec::new();

        for base in &self.dirs {
            let Ok(mut entries) = tokio::fs::read_dir(base).await else {
                continue;
            };
            let is_custom = base.to_string_lossy().contains("workspace");

            let mut names = Vec::new();
            while let Ok(Some(entry)) = entries.next_entry().await {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
            names.sort();

            for name in names {
                if let Some(skill) = read_skill(base, &name, is_custom).await {
                    skills.push(skill);
                }
            }
        }

        let available = skills.iter().filter(|s| s.available).count();
        Ok(SectionResult::Skills(SkillsReport {
            total: skills.len(),
            available,
            skills,
        }))
    }
}

async fn read_skill(base: &Path, name: &str, is_custom: bool) -> Option<SkillReport> {
    let skill_md = base.join(name).join("SKILL.md");
    let content = tokio::fs::read_to_string(&skill_md).await.ok()?;
    let head: String = content.chars().take(HEAD_CHARS).collect();

    let required_bins = extract_bins(&head);
    let mut available = true;
    for bin in &required_bins {
        let out = sh(&format!("which {bin}"), WHICH_TIMEOUT, &HashMap::new()).await;
        if !out.ok {
            available = false;
            break;
        }
    }

    Some(SkillReport {
        name: name.to_string(),
        description: extract_description(&head),
        required_bins,
        available,
        custom: is_custom,
    })
}

/// Frontmatter description, truncated to a summary length.
fn extract_description(head: &str) -> String {
    let re = Regex::new(r#"description:\s*["']?(.+?)["']?\s*\n"#).expect("static regex");
    let description = re
        .captures(head)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_matches(['"', '\'']).trim().to_string())
        .unwrap_or_default();
    description.chars().take(100).collect()
}

/// Required binaries from a `"bins": [...]` frontmatter list.
fn extract_bins(head: &str) -> Vec<String> {
    let re = Regex::new(r#""bins":\s*\[([^\]]*)\]"#).expect("static regex");
    let Some(raw) = re.captures(head).and_then(|c| c.get(1)) else {
        return Vec::new();
    };
    raw.as_str()
        .split(',')
        .map(|b| b.trim().trim_matches('"').to_string())
        .filter(|b| !b.is_empty())
        .collect()
}
