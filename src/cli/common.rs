//! Shared plumbing for CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::warn;

use super::CliConfig;
use crate::config::ProjectConfig;
use crate::decl::Declaration;
use crate::loader::{LevelIndex, LevelLoader};
use crate::resolver::{DepsResolver, ResolveOptions};

/// Level directories given on the command line.
#[derive(Args, Debug, Clone, Default)]
pub struct LevelArgs {
    /// Level directory; repeat for several levels, lowest priority first.
    /// Replaces the levels of the config file.
    #[arg(short = 'l', long = "level", value_name = "DIR")]
    pub levels: Vec<PathBuf>,
}

/// Configuration and index shared by the commands of one invocation.
#[derive(Debug)]
pub struct CommandContext {
    /// Effective configuration after command-line overrides
    pub config: ProjectConfig,
    /// Index over the effective levels
    pub index: LevelIndex,
}

impl CommandContext {
    /// Load the config file and scan the effective levels.
    ///
    /// # Errors
    ///
    /// Fails when the config file is invalid or a level does not exist.
    pub async fn load(cli: &CliConfig, levels: &LevelArgs) -> Result<Self> {
        let mut config = ProjectConfig::load_with_optional(cli.config_path.as_deref()).await?;
        if !levels.levels.is_empty() {
            config.levels = levels.levels.clone();
        }
        if config.levels.is_empty() {
            warn!("No levels configured; declared entities resolve as leaves");
        }

        let index = LevelIndex::scan(&config.levels)?;
        Ok(Self {
            config,
            index,
        })
    }

    /// A resolver over the scanned levels.
    pub fn resolver(self, options: ResolveOptions) -> DepsResolver<LevelLoader> {
        let loader = LevelLoader::new(self.index).with_suffixes(self.config.deps_suffixes);
        DepsResolver::new(loader, options)
    }
}

/// Read and parse a bundle declaration file.
pub async fn read_declaration(path: &Path) -> Result<Declaration> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read declaration {}", path.display()))?;
    Ok(Declaration::parse(path, &content)?)
}
