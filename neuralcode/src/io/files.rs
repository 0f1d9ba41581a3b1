//! Guarded read, write and edit of project files.
//!
//! Every entry point resolves its path through [`PathGuard`] before any I/O,
//! so scope and denylist violations short-circuit without touching disk.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use tracing::debug;

use crate::core::error::EngineError;
use crate::io::guard::PathGuard;

/// A single file operation, borrowing its arguments from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp<'a> {
    Read {
        path: &'a str,
    },
    Write {
        path: &'a str,
        content: &'a str,
    },
    Edit {
        path: &'a str,
        old_string: &'a str,
        new_string: &'a str,
    },
}

/// Metadata returned by [`FileExecutor::stat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: String,
    pub is_dir: bool,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

#[derive(Debug, Clone)]
pub struct FileExecutor {
    guard: PathGuard,
}

impl FileExecutor {
    pub fn new(guard: PathGuard) -> Self {
        Self { guard }
    }

    /// Run `op`. Reads return the file contents; writes and edits return a
    /// confirmation naming the path as given.
    pub fn apply(&self, op: FileOp<'_>) -> Result<String, EngineError> {
        match op {
            FileOp::Read { path } => self.read(path),
            FileOp::Write { path, content } => {
                self.write(path, content)?;
                Ok(format!("File {path} created/updated successfully"))
            }
            FileOp::Edit {
                path,
                old_string,
                new_string,
            } => {
                self.edit(path, old_string, new_string)?;
                Ok(format!("File {path} edited successfully"))
            }
        }
    }

    pub fn read(&self, path: &str) -> Result<String, EngineError> {
        let resolved = self.guard.resolve(path)?;
        read_resolved(path, &resolved)
    }

    /// Create parent directories as needed, then overwrite the file.
    ///
    /// Callers are responsible for rejecting empty content.
    pub fn write(&self, path: &str, content: &str) -> Result<(), EngineError> {
        let resolved = self.guard.resolve(path)?;
        write_resolved(path, &resolved, content)
    }

    /// Replace the first literal occurrence of `old_string`.
    ///
    /// Fails with [`EngineError::NotFound`] and leaves the file untouched when
    /// `old_string` does not occur.
    pub fn edit(&self, path: &str, old_string: &str, new_string: &str) -> Result<(), EngineError> {
        let resolved = self.guard.resolve(path)?;
        let current = read_resolved(path, &resolved)?;
        if !current.contains(old_string) {
            return Err(EngineError::NotFound {
                path: path.to_string(),
            });
        }
        let updated = current.replacen(old_string, new_string, 1);
        write_resolved(path, &resolved, &updated)
    }

    /// Sorted entry names of a directory.
    pub fn list_dir(&self, path: &str) -> Result<Vec<String>, EngineError> {
        let resolved = self.guard.resolve(path)?;
        let entries = fs::read_dir(&resolved)
            .map_err(|err| EngineError::io(format!("Failed to list directory {path}"), err))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|err| EngineError::io(format!("Failed to list directory {path}"), err))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    pub fn stat(&self, path: &str) -> Result<FileInfo, EngineError> {
        let resolved = self.guard.resolve(path)?;
        let meta = fs::metadata(&resolved)
            .map_err(|err| EngineError::io(format!("Failed to stat {path}"), err))?;
        Ok(FileInfo {
            path: path.to_string(),
            is_dir: meta.is_dir(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

fn read_resolved(path: &str, resolved: &Path) -> Result<String, EngineError> {
    debug!(path = %resolved.display(), "reading file");
    fs::read_to_string(resolved)
        .map_err(|err| EngineError::io(format!("Failed to read file {path}"), err))
}

fn write_resolved(path: &str, resolved: &Path, content: &str) -> Result<(), EngineError> {
    if let Some(parent) = resolved.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| EngineError::io(format!("Failed to write file {path}"), err))?;
    }
    debug!(path = %resolved.display(), bytes = content.len(), "writing file");
    fs::write(resolved, content)
        .map_err(|err| EngineError::io(format!("Failed to write file {path}"), err))
}
