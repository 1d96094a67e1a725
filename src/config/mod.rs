//! Configuration for bemdeps.
//!
//! A project keeps its settings in `bemdeps.toml` next to its levels.
//! Precedence, highest first:
//!
//! 1. command-line flags (`--level`, `--strict`)
//! 2. the file given with `--config`, or `bemdeps.toml` in the working directory
//! 3. built-in defaults
//!
//! Level paths in the file are relative to the file's directory.

pub mod project;

pub use project::{CONFIG_FILE_NAME, ProjectConfig};
