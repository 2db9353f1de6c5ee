use std::collections::BTreeMap;
use std::fs::{OpenOptions, create_dir_all};
use std::path::PathBuf;
use std::process::Command;

use chrono::{DateTime, Utc};
use quillplan_engine::{AttemptRecord, EnforcementReport};
use serde::Serialize;

use crate::output::{Artifact, write_document};
use crate::settings::Settings;

use super::RegistryResult;

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub run_dir: PathBuf,
    pub request_path: PathBuf,
    pub settings: Settings,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub request_path: String,
    pub settings: Settings,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Directory of one planning run.
#[derive(Debug, Clone)]
pub struct RunDir {
    pub root: PathBuf,
}

impl RunDir {
    pub fn path(&self, artifact: Artifact) -> PathBuf {
        self.root.join(artifact.file_name())
    }

    pub fn logs_path(&self) -> PathBuf {
        self.root.join("logs.ndjson")
    }

    pub fn write<T: Serialize>(&self, artifact: Artifact, value: &T) -> RegistryResult<PathBuf> {
        let path = self.path(artifact);
        write_document(&path, value)?;
        Ok(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Accepted,
    Failed,
}

/// Summary written to `report.json` when a run ends.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub status: RunStatus,
    pub attempts: u32,
    pub history: Vec<AttemptRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enforcement: Option<EnforcementReport>,
    pub word_targets: BTreeMap<String, i64>,
    pub duration_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn start_run(ctx: &RunContext) -> RegistryResult<RunDir> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let run = RunDir {
        root: ctx.run_dir.join(format!("{timestamp}__run_{}", ctx.run_id)),
    };
    create_dir_all(&run.root)?;

    let config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339(),
        request_path: ctx.request_path.display().to_string(),
        settings: ctx.settings.clone(),
        git: collect_git_info(),
    };
    run.write(Artifact::Config, &config)?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(run.logs_path())?;

    Ok(run)
}

pub fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_directory_holds_config_and_log_file() {
        let run_dir = std::env::temp_dir().join(format!("quillplan-runs-{}", uuid::Uuid::new_v4()));
        let ctx = RunContext {
            run_id: "abc".to_string(),
            started_at: DateTime::parse_from_rfc3339("2026-03-01T08:30:00Z")
                .expect("timestamp")
                .with_timezone(&Utc),
            run_dir: run_dir.clone(),
            request_path: PathBuf::from("request.json"),
            settings: Settings::default(),
        };

        let run = start_run(&ctx).expect("start run");
        assert_eq!(run.root, run_dir.join("2026-03-01T08-30-00Z__run_abc"));
        assert!(run.logs_path().exists());
        assert_eq!(
            run.path(Artifact::Report),
            run.root.join("report.json")
        );

        let config: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(run.path(Artifact::Config)).expect("read config"),
        )
        .expect("parse config");
        assert_eq!(config["run_id"], "abc");
        assert_eq!(config["settings"]["planner"]["max_attempts"], 2);

        std::fs::remove_dir_all(run_dir).expect("cleanup");
    }
}
