//! Declaration formats.
//!
//! - [`fragment`] - `DeclFragment` shorthand and its unfolding into entities
//! - [`file`] - per-entity declaration files with `mustDeps`/`shouldDeps`/`noDeps`
//! - [`bemdecl`] - bundle declarations in bemdecl (tree) or deps (flat) form

pub mod bemdecl;
pub mod file;
pub mod fragment;

pub use bemdecl::{BemDeclBlock, Declaration, bemdecl_from_entities};
pub use file::{DeclFile, DeclFormat, DeclItem, ResolvedItem};
pub use fragment::{DeclFragment, FragmentScope, OneOrMany, unfold_all};
