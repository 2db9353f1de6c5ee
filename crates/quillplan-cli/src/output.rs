use std::fs::{File, OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("output path '{0}' has no file name")]
    NoFileName(PathBuf),
}

pub type OutputResult<T> = Result<T, OutputError>;

/// Files a planning run leaves in its directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Config,
    Schema,
    Skeleton,
    Plan,
    Report,
}

impl Artifact {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Config => "config.json",
            Self::Schema => "schema.json",
            Self::Skeleton => "skeleton.json",
            Self::Plan => "plan.json",
            Self::Report => "report.json",
        }
    }
}

/// Pretty JSON with a trailing newline. Readers never see a half-written plan:
/// the bytes go to a staging file that replaces `path` once synced.
pub fn write_document<T: Serialize>(path: &Path, value: &T) -> OutputResult<()> {
    let mut data = serde_json::to_vec_pretty(value)?;
    data.push(b'\n');
    replace_file(path, &data)
}

pub fn write_text(path: &Path, text: &str) -> OutputResult<()> {
    replace_file(path, text.as_bytes())
}

fn replace_file(path: &Path, data: &[u8]) -> OutputResult<()> {
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
        create_dir_all(parent)?;
    }

    let staging = staging_path(path)?;
    if let Err(err) = stage(&staging, data).and_then(|()| std::fs::rename(&staging, path)) {
        let _ = std::fs::remove_file(&staging);
        return Err(err.into());
    }
    if let Some(parent) = parent {
        File::open(parent)?.sync_all()?;
    }
    Ok(())
}

fn stage(staging: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(staging)?;
    file.write_all(data)?;
    file.sync_all()
}

/// `.plan.json.<pid>.partial` next to the target, hidden from `ls`.
fn staging_path(path: &Path) -> OutputResult<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| OutputError::NoFileName(path.to_path_buf()))?;
    let staged = format!(
        ".{}.{}.partial",
        file_name.to_string_lossy(),
        std::process::id()
    );
    Ok(path.with_file_name(staged))
}
