//! File tools scoped to a root directory
//!
//! Every path an agent supplies is resolved lexically against the scope
//! root before any filesystem call. Absolute paths and `..` escapes fail
//! with `PermissionDenied` without touching the disk. Writes to the same
//! resolved path are serialized through a per-path lock so a future
//! parallel execution policy cannot interleave partial writes.

use crate::tools::registry::Tool;
use crate::types::{MuseError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// A root directory all relative paths resolve under.
#[derive(Debug, Clone)]
pub struct PathScope {
    root: PathBuf,
}

impl PathScope {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a user-supplied path inside the scope. The check is lexical
    /// (the target may not exist yet), so `..` components are rejected as
    /// soon as they would climb past the root.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf> {
        let requested = Path::new(raw);
        let denied = || MuseError::PermissionDenied {
            path: requested.to_path_buf(),
            root: self.root.clone(),
        };

        if requested.is_absolute() {
            return Err(denied());
        }

        let mut resolved = PathBuf::new();
        for component in requested.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !resolved.pop() {
                        return Err(denied());
                    }
                }
                Component::RootDir | Component::Prefix(_) => return Err(denied()),
            }
        }

        Ok(self.root.join(resolved))
    }
}

/// Per-path write locks shared by all write-tool instances of a registry.
pub struct PathLocks {
    locks: parking_lot::Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self {
            locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn lock_for(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

impl Default for PathLocks {
    fn default() -> Self {
        Self::new()
    }
}

// ============= Directory Listing =============

pub struct DirectoryReadTool {
    scope: PathScope,
}

impl DirectoryReadTool {
    pub fn new(scope: PathScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl Tool for DirectoryReadTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "List the file names in a directory under the drafts root"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory to list, relative to the drafts root (default: the root itself)"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let raw = args.get("path").and_then(|v| v.as_str()).unwrap_or(".");
        let dir = self.scope.resolve(raw)?;

        let mut entries = Vec::new();
        let mut reader = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| MuseError::Tool(format!("cannot list '{}': {}", raw, e)))?;
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| MuseError::Tool(format!("cannot list '{}': {}", raw, e)))?
        {
            entries.push(entry.file_name().to_string_lossy().into_owned());
        }
        entries.sort();

        Ok(json!({
            "path": raw,
            "entries": entries,
            "count": entries.len()
        }))
    }
}

// ============= File Read =============

pub struct FileReadTool {
    scope: PathScope,
}

impl FileReadTool {
    pub fn new(scope: PathScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a text file under the drafts root"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File to read, relative to the drafts root"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let raw = args
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| MuseError::Tool("'path' is required".to_string()))?;
        let path = self.scope.resolve(raw)?;

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| MuseError::Tool(format!("cannot read '{}': {}", raw, e)))?;

        Ok(json!({
            "path": raw,
            "content": content
        }))
    }
}

// ============= File Write =============

pub struct FileWriteTool {
    scope: PathScope,
    locks: Arc<PathLocks>,
}

impl FileWriteTool {
    pub fn new(scope: PathScope, locks: Arc<PathLocks>) -> Self {
        Self { scope, locks }
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write a text file under the drafts root, creating parent directories"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File to write, relative to the drafts root"
                },
                "content": {
                    "type": "string",
                    "description": "Full text content to write"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let raw = args
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| MuseError::Tool("'path' is required".to_string()))?;
        let content = args
            .get("content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| MuseError::Tool("'content' is required".to_string()))?;

        let path = self.scope.resolve(raw)?;

        let lock = self.locks.lock_for(&path);
        let _guard = lock.lock().await;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MuseError::Tool(format!("cannot create '{}': {}", raw, e)))?;
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| MuseError::Tool(format!("cannot write '{}': {}", raw, e)))?;

        Ok(json!({
            "path": raw,
            "bytes_written": content.len()
        }))
    }
}
