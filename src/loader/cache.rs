//! Parsed declaration files shared across resolution runs.
//!
//! Entries are keyed by path and validated against the file's modification
//! time; a changed file is re-parsed on the next lookup. Clones share the same
//! storage, so one cache can be handed to several loaders.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;

use dashmap::DashMap;

use crate::decl::DeclFile;

#[derive(Debug)]
struct CachedDecl {
    modified: SystemTime,
    file: Arc<DeclFile>,
}

/// Cache of parsed declaration files keyed by path and modification time.
#[derive(Debug, Clone, Default)]
pub struct DeclCache {
    /// Parsed files by path
    entries: Arc<DashMap<PathBuf, CachedDecl>>,
    hits: Arc<AtomicUsize>,
    misses: Arc<AtomicUsize>,
}

impl DeclCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The parsed file at `path` if it was cached for the same `modified` time.
    pub fn get(&self, path: &Path, modified: SystemTime) -> Option<Arc<DeclFile>> {
        let hit = self
            .entries
            .get(path)
            .filter(|entry| entry.modified == modified)
            .map(|entry| Arc::clone(&entry.file));

        let counter = if hit.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        hit
    }

    /// Store a parsed file, replacing any older version.
    pub fn insert(&self, modified: SystemTime, file: DeclFile) -> Arc<DeclFile> {
        let file = Arc::new(file);
        self.entries.insert(
            file.path.clone(),
            CachedDecl {
                modified,
                file: Arc::clone(&file),
            },
        );
        file
    }

    /// Drop the entry for `path`.
    pub fn invalidate(&self, path: &Path) {
        self.entries.remove(path);
    }

    /// Number of cached files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no files.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that missed or found a stale entry.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}
