//! Draft artifact persistence
//!
//! Each task's result lands in the drafts directory under a stable,
//! collision-free name: the task's position prefix plus a slug of its name.
//! Validated records are written as pretty JSON (`NN-task.json`), raw text
//! as markdown (`NN-task.md`).

use crate::types::{ContentRecord, MuseError, Result};
use std::path::{Path, PathBuf};

pub struct DraftStore {
    root: PathBuf,
}

impl DraftStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Make sure the drafts directory exists.
    pub async fn prepare(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Persist a validated record; returns the artifact path.
    pub async fn write_record(
        &self,
        position: usize,
        task: &str,
        record: &ContentRecord,
    ) -> Result<PathBuf> {
        let path = self.artifact_path(position, task, "json");
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| MuseError::Internal(format!("record serialization failed: {}", e)))?;
        tokio::fs::write(&path, json).await?;
        Ok(path)
    }

    /// Persist a raw text result; returns the artifact path.
    pub async fn write_raw(&self, position: usize, task: &str, text: &str) -> Result<PathBuf> {
        let path = self.artifact_path(position, task, "md");
        tokio::fs::write(&path, text).await?;
        Ok(path)
    }

    /// Read a previously written record back.
    pub async fn read_record(&self, path: &Path) -> Result<ContentRecord> {
        let raw = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&raw)
            .map_err(|e| MuseError::Validation(format!("stored record is invalid: {}", e)))
    }

    fn artifact_path(&self, position: usize, task: &str, extension: &str) -> PathBuf {
        self.root
            .join(format!("{:02}-{}.{}", position + 1, slug(task), extension))
    }
}

/// Lowercase, alphanumeric-and-dash form of a task name.
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
