//! Temporary BEM levels on disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// A temporary project holding any number of level directories.
///
/// Files are placed the way BEM projects lay them out:
/// `<level>/<block>/[__<elem>/][_<mod>/]<name>.<suffix>`.
pub struct LevelFixture {
    temp_dir: TempDir,
}

impl LevelFixture {
    /// Create an empty project.
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new().context("Failed to create temp directory")?,
        })
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of a level directory, created if missing.
    pub fn level(&self, name: &str) -> Result<PathBuf> {
        let path = self.root().join(name);
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create level {}", path.display()))?;
        Ok(path)
    }

    /// Write an entity file into `level`.
    ///
    /// `entity` is a key without tech such as `button__text_size_m`.
    pub fn add_entity_file(
        &self,
        level: &str,
        entity: &str,
        suffix: &str,
        content: &str,
    ) -> Result<PathBuf> {
        let parsed: crate::core::Entity = entity.parse()?;
        let mut dir = self.level(level)?.join(&parsed.block);
        if let Some(elem) = &parsed.elem {
            dir = dir.join(format!("__{elem}"));
        }
        if let Some(mod_name) = &parsed.mod_name {
            dir = dir.join(format!("_{mod_name}"));
        }
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let path = dir.join(format!("{entity}.{suffix}"));
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write a `deps.json` declaration for `entity` into `level`.
    pub fn add_deps(&self, level: &str, entity: &str, content: &str) -> Result<PathBuf> {
        self.add_entity_file(level, entity, "deps.json", content)
    }

    /// Write a file relative to the project root.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}
