use std::io;
use std::path::Path;
use std::time::Duration;

use quillplan_contract::PacingProfile;
use quillplan_engine::{PlannerOptions, RetryPolicy};
use quillplan_ollama::OllamaConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::output::{OutputError, write_text};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("output error: {0}")]
    Output(#[from] OutputError),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("toml encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Retry and validation knobs of the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
    pub validate: bool,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            retry_delay_ms: 500,
            timeout_secs: 180,
            validate: true,
        }
    }
}

/// Contents of `quillplan.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm: OllamaConfig,
    pub planner: PlannerSettings,
    pub pacing: PacingProfile,
}

impl Settings {
    pub fn planner_options(&self) -> PlannerOptions {
        PlannerOptions {
            pacing: self.pacing.clone(),
            retry: RetryPolicy::new(
                self.planner.max_attempts,
                Duration::from_millis(self.planner.retry_delay_ms),
            ),
            timeout: Duration::from_secs(self.planner.timeout_secs),
            validate: self.planner.validate,
        }
    }
}

pub fn load_or_create_settings(path: &Path) -> SettingsResult<Settings> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        if settings.pacing.acts.is_empty() {
            return Err(SettingsError::Invalid(
                "pacing needs at least one act".to_string(),
            ));
        }
        return Ok(settings);
    }

    let settings = Settings::default();
    save_settings(path, &settings)?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &Settings) -> SettingsResult<()> {
    let encoded = toml::to_string_pretty(settings)?;
    write_text(path, &encoded)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("quillplan-settings-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = scratch_dir();
        let path = dir.join("quillplan.toml");

        let created = load_or_create_settings(&path).expect("create settings");
        assert_eq!(created, Settings::default());
        assert!(path.exists());

        let loaded = load_or_create_settings(&path).expect("load settings");
        assert_eq!(loaded, created);
        assert_eq!(loaded.pacing.total_chapters(), 24);

        std::fs::remove_dir_all(dir).expect("cleanup");
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = scratch_dir();
        let path = dir.join("quillplan.toml");
        std::fs::write(
            &path,
            "[llm]\nmodel = \"qwen2.5:14b\"\n\n[planner]\nmax_attempts = 3\n",
        )
        .expect("write settings");

        let settings = load_or_create_settings(&path).expect("load settings");
        assert_eq!(settings.llm.model, "qwen2.5:14b");
        assert_eq!(settings.planner.max_attempts, 3);
        assert_eq!(settings.planner.timeout_secs, 180);

        let options = settings.planner_options();
        assert_eq!(options.retry.max_attempts(), 3);
        assert_eq!(options.timeout, Duration::from_secs(180));

        std::fs::remove_dir_all(dir).expect("cleanup");
    }

    #[test]
    fn empty_pacing_is_rejected() {
        let dir = scratch_dir();
        let path = dir.join("quillplan.toml");
        std::fs::write(&path, "[pacing]\nacts = []\n").expect("write settings");

        assert!(matches!(
            load_or_create_settings(&path),
            Err(SettingsError::Invalid(_))
        ));

        std::fs::remove_dir_all(dir).expect("cleanup");
    }
}
