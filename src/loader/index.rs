//! Level index: entity files found under BEM level directories.
//!
//! A level is a directory tree whose file names follow the BEM convention
//! `block[__elem][_mod[_val]].suffix`, e.g.
//!
//! ```text
//! common.blocks/
//! └── button/
//!     ├── button.css
//!     ├── button.deps.json
//!     ├── __text/button__text.css
//!     └── _theme/button_theme_dark.deps.yaml
//! ```
//!
//! Directory layout is not interpreted; only file names are. Levels are kept
//! in the order given so that later levels override or extend earlier ones.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::core::{BemError, Entity, ModVal};

/// A file attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    /// Full path of the file
    pub path: PathBuf,
    /// Everything after the entity name, e.g. `css` or `deps.json`
    pub suffix: String,
    /// Position of the level in the scanned level list
    pub level: usize,
}

/// Entity/file index over a list of levels.
#[derive(Debug, Clone, Default)]
pub struct LevelIndex {
    levels: Vec<PathBuf>,
    entities: HashMap<Entity, Vec<IndexedFile>>,
}

impl LevelIndex {
    /// Scan `levels` in order.
    ///
    /// # Errors
    ///
    /// Returns [`BemError::LevelNotFound`] for a level that is not a directory
    /// and [`BemError::Io`] when walking a level fails.
    pub fn scan<P: AsRef<Path>>(levels: &[P]) -> Result<Self, BemError> {
        let mut index = Self::default();
        for level in levels {
            index.add_level(level.as_ref())?;
        }
        Ok(index)
    }

    /// Scan one more level after the existing ones.
    pub fn add_level(&mut self, level: &Path) -> Result<(), BemError> {
        if !level.is_dir() {
            return Err(BemError::LevelNotFound {
                path: level.display().to_string(),
            });
        }

        let level_no = self.levels.len();
        self.levels.push(level.to_path_buf());
        let mut count = 0usize;

        for entry in WalkDir::new(level).sort_by_file_name() {
            let entry = entry.map_err(|e| match e.into_io_error() {
                Some(io) => BemError::Io(io),
                None => BemError::Other {
                    message: format!("filesystem loop under '{}'", level.display()),
                },
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(file_name) = entry.file_name().to_str() else {
                continue;
            };
            let Some((entity, suffix)) = parse_file_name(file_name) else {
                trace!("Skipping non-BEM file {}", entry.path().display());
                continue;
            };

            trace!("Indexed {} as {entity} ({suffix})", entry.path().display());
            self.entities.entry(entity).or_default().push(IndexedFile {
                path: entry.path().to_path_buf(),
                suffix,
                level: level_no,
            });
            count += 1;
        }

        debug!("Indexed {count} file(s) in level {}", level.display());
        Ok(())
    }

    /// Scanned levels in order.
    pub fn levels(&self) -> &[PathBuf] {
        &self.levels
    }

    /// Files of a block or one of its modifiers, in level order.
    pub fn block_entities(
        &self,
        block: &str,
        mod_name: Option<&str>,
        mod_val: Option<&ModVal>,
    ) -> &[IndexedFile] {
        self.lookup(Entity::block(block), mod_name, mod_val)
    }

    /// Files of an element or one of its modifiers, in level order.
    pub fn elem_entities(
        &self,
        block: &str,
        elem: &str,
        mod_name: Option<&str>,
        mod_val: Option<&ModVal>,
    ) -> &[IndexedFile] {
        self.lookup(Entity::elem(block, elem), mod_name, mod_val)
    }

    fn lookup(&self, mut entity: Entity, mod_name: Option<&str>, mod_val: Option<&ModVal>) -> &[IndexedFile] {
        entity.mod_name = mod_name.map(str::to_string);
        entity.mod_val = mod_name.and(mod_val.cloned());
        self.files_of(&entity)
    }

    /// All files of `entity`, ignoring its tech.
    pub fn files_of(&self, entity: &Entity) -> &[IndexedFile] {
        let key = if entity.tech.is_some() {
            entity.clone().with_tech(None)
        } else {
            entity.clone()
        };
        self.entities.get(&key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Files of `entity` with exactly `suffix`, in level order.
    pub fn files(&self, entity: &Entity, suffix: &str) -> Vec<&IndexedFile> {
        self.files_of(entity).iter().filter(|f| f.suffix == suffix).collect()
    }

    /// Every indexed entity with its files, sorted by key.
    pub fn entities(&self) -> Vec<(&Entity, &[IndexedFile])> {
        let mut entities: Vec<_> =
            self.entities.iter().map(|(entity, files)| (entity, files.as_slice())).collect();
        entities.sort_by_key(|(entity, _)| entity.key());
        entities
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether nothing was indexed.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Split a BEM file name into its entity and suffix.
///
/// Names without a suffix or not following the convention yield `None`.
pub fn parse_file_name(file_name: &str) -> Option<(Entity, String)> {
    let entity: Entity = file_name.parse().ok()?;
    let suffix = entity.tech.clone()?;
    Some((entity.with_tech(None), suffix))
}
