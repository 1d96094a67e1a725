//! Filesystem [`DeclLoader`] over a [`LevelIndex`].

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::trace;

use super::cache::DeclCache;
use super::index::LevelIndex;
use super::{DEFAULT_DEPS_SUFFIXES, DeclLoader};
use crate::core::Entity;
use crate::decl::DeclFile;

/// Reads declaration files of indexed entities from disk.
///
/// Files come in level order, and within a level in suffix order
/// (`deps.json`, `deps.yaml`, `deps.yml` by default).
#[derive(Debug, Clone)]
pub struct LevelLoader {
    index: Arc<LevelIndex>,
    suffixes: Vec<String>,
    cache: DeclCache,
}

impl LevelLoader {
    /// Loader over `index` with the default suffixes and a fresh cache.
    pub fn new(index: LevelIndex) -> Self {
        Self {
            index: Arc::new(index),
            suffixes: DEFAULT_DEPS_SUFFIXES.iter().map(|s| (*s).to_string()).collect(),
            cache: DeclCache::new(),
        }
    }

    /// Replace the declaration suffixes.
    #[must_use]
    pub fn with_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.suffixes = suffixes;
        self
    }

    /// Use a shared parse cache.
    #[must_use]
    pub fn with_cache(mut self, cache: DeclCache) -> Self {
        self.cache = cache;
        self
    }

    /// The underlying index.
    pub fn index(&self) -> &LevelIndex {
        &self.index
    }

    /// The parse cache.
    pub fn cache(&self) -> &DeclCache {
        &self.cache
    }
}

impl DeclLoader for LevelLoader {
    async fn files_for(&self, entity: &Entity) -> Result<Vec<DeclFile>> {
        let mut files: Vec<_> = self
            .index
            .files_of(entity)
            .iter()
            .filter_map(|f| self.suffixes.iter().position(|s| *s == f.suffix).map(|rank| (f, rank)))
            .collect();
        files.sort_by_key(|(f, rank)| (f.level, *rank));

        let mut out = Vec::with_capacity(files.len());
        for (indexed, _) in files {
            let path = &indexed.path;
            let metadata = tokio::fs::metadata(path)
                .await
                .with_context(|| format!("Failed to stat declaration file {}", path.display()))?;
            let modified = metadata.modified()?;

            if let Some(cached) = self.cache.get(path, modified) {
                trace!("Declaration cache hit for {}", path.display());
                out.push(DeclFile::clone(&cached));
                continue;
            }

            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read declaration file {}", path.display()))?;
            let parsed = DeclFile::parse(path.clone(), &content)?;
            trace!("Parsed {} item(s) from {}", parsed.items.len(), path.display());
            out.push(DeclFile::clone(&self.cache.insert(modified, parsed)));
        }

        Ok(out)
    }
}
