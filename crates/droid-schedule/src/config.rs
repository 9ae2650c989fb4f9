//! Schedule configuration
//!
//! Loads `[[schedules]]` entries from a TOML file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DEFAULT_SCHEDULE_PATH: &str = "schedule.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub schedules: Vec<ScheduleEntry>,
}

/// A crew run triggered by a cron expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub name: String,

    /// Five fields ("0 9 * * *" = every day at 09:00) or six with seconds
    pub cron: String,

    /// Crew to run
    pub crew: String,

    /// Fixed inputs passed to every run
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,

    /// Lower runs first when several entries are due at the same instant
    #[serde(default = "default_priority")]
    pub priority: u32,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_priority() -> u32 {
    5
}

fn default_enabled() -> bool {
    true
}

impl ScheduleConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from `path` (or `schedule.toml`); a missing file yields no schedules
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = path.unwrap_or(DEFAULT_SCHEDULE_PATH);
        if !Path::new(path).exists() {
            tracing::info!(path, "No schedule file found, scheduler has no entries");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    pub fn enabled_entries(&self) -> Vec<&ScheduleEntry> {
        self.schedules.iter().filter(|e| e.enabled).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[[schedules]]
name = "morning_post"
cron = "0 9 * * *"
crew = "social_media_team"
inputs = { niche = "rust" }

[[schedules]]
name = "weekly_research"
cron = "0 0 8 * * Mon"
crew = "content_research_team"
priority = 1
enabled = false
"#;
        let config = ScheduleConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.schedules.len(), 2);

        let first = &config.schedules[0];
        assert_eq!(first.crew, "social_media_team");
        assert_eq!(first.inputs["niche"], "rust");
        assert_eq!(first.priority, 5);
        assert!(first.enabled);

        assert_eq!(config.enabled_entries().len(), 1);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = ScheduleConfig::load(path.to_str()).unwrap();
        assert!(config.schedules.is_empty());
    }

    #[test]
    fn test_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.toml");
        std::fs::write(&path, "[[schedules]]\nname = 1\n").unwrap();
        assert!(ScheduleConfig::load(path.to_str()).is_err());
    }
}
