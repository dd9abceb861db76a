//! Scratch directories for stage tests.

use crate::io::json::write_json_array;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory that is removed when dropped, with helpers for
/// seeding stage inputs.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a new temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new() -> Result<Self> {
        let dir = TempDir::new().context("create temporary workspace")?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of `name` inside the workspace. The file is not created.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write raw text to `name` and return its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_text(&self, name: &str, text: &str) -> Result<PathBuf> {
        let path = self.path(name);
        std::fs::write(&path, text).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    /// Write `records` as the indented JSON array an Extractor produces.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_records<T: Serialize>(&self, name: &str, records: &[T]) -> Result<PathBuf> {
        let path = self.path(name);
        let mut buf = Vec::new();
        write_json_array(&mut buf, records, true)?;
        std::fs::write(&path, buf).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}
