//! bemdeps - BEM dependency resolution
//!
//! Expands a bundle declaration into the ordered, transitively closed list of
//! BEM entities (blocks, elements, modifiers) it needs, following the
//! `mustDeps`, `shouldDeps` and `noDeps` declarations kept next to each entity
//! in level directories.
//!
//! # Architecture Overview
//!
//! - A **declaration** names the entities a bundle needs, either as a
//!   `bemdecl` tree or as a flat `deps` list.
//! - **Levels** are directories of entity files named
//!   `block[__elem][_mod[_val]].suffix`; declaration files carry the
//!   `deps.json` / `deps.yaml` suffixes.
//! - **Expansion** reads declaration files until no new entity appears.
//! - **Ordering** emits must-dependencies before their dependents, keeps
//!   declaration order otherwise, and breaks must-cycles (or rejects them in
//!   strict mode).
//!
//! # Core Modules
//!
//! - [`core`] - Entity identity and error handling
//! - [`decl`] - Declaration fragments, declaration files, bemdecl conversion
//! - [`loader`] - Level index and declaration loading
//! - [`resolver`] - Dependency graph, expansion and ordering
//! - [`config`] - Project configuration (`bemdeps.toml`)
//! - [`cli`] - Command-line interface
//!
//! # Declaration File Format
//!
//! ```json
//! [
//!   { "mustDeps": ["i-bem"], "shouldDeps": { "elems": ["text", "icon"] } },
//!   { "tech": "js", "mustDeps": { "block": "i-bem", "tech": "bemhtml" } },
//!   { "elem": "icon", "shouldDeps": { "mods": { "size": ["s", "m"] } } },
//!   { "noDeps": "legacy-reset" }
//! ]
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use bemdeps::decl::Declaration;
//! use bemdeps::loader::{LevelIndex, LevelLoader};
//! use bemdeps::resolver::{DepsResolver, ResolveOptions};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let index = LevelIndex::scan(&["common.blocks", "desktop.blocks"])?;
//! let resolver = DepsResolver::new(LevelLoader::new(index), ResolveOptions::default());
//!
//! let declaration = Declaration::parse(
//!     "page.deps.json".as_ref(),
//!     r#"["page", {"block": "button", "mods": {"theme": "islands"}}]"#,
//! )?;
//! let resolution = resolver.resolve(&declaration).await?;
//! println!("{}", serde_json::to_string_pretty(&resolution.to_deps_json())?);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod decl;
pub mod loader;
pub mod resolver;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
