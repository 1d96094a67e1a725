//! Command-line interface for bemdeps.
//!
//! # Commands
//!
//! - `resolve` - Expand a declaration and print its ordered dependencies
//! - `tree` - Print the must/should dependency tree of a declaration
//! - `index` - List the entities and files found in the levels
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - Debug logging
//! - `--quiet` / `-q` - Errors only
//! - `--config` / `-c` - Path to `bemdeps.toml`
//!
//! # Examples
//!
//! ```bash
//! bemdeps resolve page.bemdecl.json --level common.blocks --level desktop.blocks
//! bemdeps resolve page.deps.json --format json --strict
//! bemdeps tree page.bemdecl.json
//! bemdeps index --level common.blocks
//! ```
//!
//! Log output goes to stderr; `RUST_LOG` takes effect unless `--verbose` or
//! `--quiet` is given.

pub mod common;
mod index;
mod resolve;
mod tree;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive; `None` defers to `RUST_LOG`
    pub log_level: Option<String>,
    /// Explicit config file
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Create a config with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// Later calls are no-ops.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init();
    }
}

/// BEM dependency resolver.
#[derive(Parser)]
#[command(
    name = "bemdeps",
    about = "Resolve BEM declarations into ordered dependency lists",
    version,
    long_about = "bemdeps indexes BEM levels, expands bundle declarations through \
                  mustDeps/shouldDeps/noDeps files and prints the ordered result."
)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress everything but errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the config file (default: ./bemdeps.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a declaration into an ordered dependency list
    Resolve(resolve::ResolveCommand),

    /// Show the dependency tree of a declaration
    Tree(tree::TreeCommand),

    /// List indexed entities and their files
    Index(index::IndexCommand),
}

impl Cli {
    /// Execute the selected command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Execute the selected command with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Resolve(cmd) => cmd.execute(&config).await,
            Commands::Tree(cmd) => cmd.execute(&config).await,
            Commands::Index(cmd) => cmd.execute(&config).await,
        }
    }
}
