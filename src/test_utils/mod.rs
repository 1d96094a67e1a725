//! Test utilities for bemdeps
//!
//! This module provides helpers for writing tests against the resolver
//! without touching the real filesystem, plus fixtures that lay out BEM
//! levels in temporary directories when the filesystem is the point.
//!
//! # Example
//!
//! ```rust,no_run
//! use bemdeps::core::Entity;
//! use bemdeps::resolver::{DepsResolver, ResolveOptions};
//! use bemdeps::test_utils::MemoryLoader;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let loader = MemoryLoader::new()
//!     .with_file("page", r#"{"mustDeps": "reset"}"#);
//! let resolver = DepsResolver::new(loader, ResolveOptions::default());
//! let resolution = resolver.resolve_entities(&[Entity::block("page")]).await?;
//! assert_eq!(resolution.items.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod levels;
pub mod memory;

pub use levels::LevelFixture;
pub use memory::MemoryLoader;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Installs the tracing subscriber once, however often it is called. Uses
/// `level` when given, otherwise `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=bemdeps=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
