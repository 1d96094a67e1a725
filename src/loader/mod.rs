//! Declaration loading.
//!
//! The expansion engine only sees the [`DeclLoader`] trait: given an entity,
//! return its parsed declaration files in a stable order. The filesystem
//! implementation is built from three parts:
//!
//! - [`index`] - scans level directories into an entity/file index
//! - [`cache`] - parsed declaration files keyed by path and modification time
//! - [`fs`] - [`LevelLoader`], reading declaration files listed by the index

pub mod cache;
pub mod fs;
pub mod index;

use anyhow::Result;

use crate::core::Entity;
use crate::decl::DeclFile;

pub use cache::DeclCache;
pub use fs::LevelLoader;
pub use index::{IndexedFile, LevelIndex};

/// Suffixes of declaration files, in lookup order.
pub const DEFAULT_DEPS_SUFFIXES: &[&str] = &["deps.json", "deps.yaml", "deps.yml"];

/// Source of per-entity declaration files.
pub trait DeclLoader {
    /// Declaration files of `entity`, in the order their statements apply.
    ///
    /// An entity without files is a leaf and yields an empty list.
    ///
    /// # Errors
    ///
    /// Fails when a file cannot be read or parsed; the error names the path.
    fn files_for(
        &self,
        entity: &Entity,
    ) -> impl std::future::Future<Output = Result<Vec<DeclFile>>> + Send;
}
