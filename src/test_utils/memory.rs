//! In-memory [`DeclLoader`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;

use crate::core::Entity;
use crate::decl::DeclFile;
use crate::loader::DeclLoader;

/// Loader serving declaration files from memory.
///
/// Files are registered per entity key (without tech) and parsed on each
/// request, so malformed content surfaces through the resolver exactly like
/// a malformed file on disk.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    files: HashMap<String, Vec<(PathBuf, String)>>,
    requests: AtomicUsize,
}

impl MemoryLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a JSON declaration file for `key`, named `<key>.deps.json`.
    #[must_use]
    pub fn with_file(self, key: &str, content: &str) -> Self {
        self.with_file_at(key, format!("{key}.deps.json"), content)
    }

    /// Add a YAML declaration file for `key`, named `<key>.deps.yaml`.
    #[must_use]
    pub fn with_yaml(self, key: &str, content: &str) -> Self {
        self.with_file_at(key, format!("{key}.deps.yaml"), content)
    }

    /// Add a declaration file for `key` under an explicit path.
    #[must_use]
    pub fn with_file_at(mut self, key: &str, path: impl Into<PathBuf>, content: &str) -> Self {
        self.files.entry(key.to_string()).or_default().push((path.into(), content.to_string()));
        self
    }

    /// Number of `files_for` calls so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl DeclLoader for MemoryLoader {
    async fn files_for(&self, entity: &Entity) -> Result<Vec<DeclFile>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let Some(files) = self.files.get(&entity.name()) else {
            return Ok(Vec::new());
        };

        let mut parsed = Vec::with_capacity(files.len());
        for (path, content) in files {
            parsed.push(DeclFile::parse(path.clone(), content)?);
        }
        Ok(parsed)
    }
}
