//! Project configuration file (`bemdeps.toml`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::core::BemError;
use crate::loader::DEFAULT_DEPS_SUFFIXES;
use crate::resolver::{DEFAULT_MAX_ITERATIONS, ResolveOptions};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "bemdeps.toml";

/// Settings shared by every command.
///
/// ```toml
/// levels = ["common.blocks", "desktop.blocks"]
/// strict = false
/// max_iterations = 10000
/// deps_suffixes = ["deps.json", "deps.yaml", "deps.yml"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Level directories, lowest priority first
    pub levels: Vec<PathBuf>,
    /// Treat must-cycles as errors
    pub strict: bool,
    /// Maximum number of expansion layers
    pub max_iterations: usize,
    /// Declaration file suffixes in lookup order
    pub deps_suffixes: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            levels: Vec::new(),
            strict: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            deps_suffixes: DEFAULT_DEPS_SUFFIXES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl ProjectConfig {
    /// Load `bemdeps.toml` from `dir`, or defaults when there is none.
    pub async fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!("No {CONFIG_FILE_NAME} in {}, using defaults", dir.display());
            Ok(Self::default())
        }
    }

    /// Load from an explicit path, or discover in the working directory.
    ///
    /// # Errors
    ///
    /// An explicit path that does not exist is an error; a missing discovered
    /// file is not.
    pub async fn load_with_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if !path.exists() => Err(BemError::ConfigError {
                message: format!("Config file {} does not exist", path.display()),
            }
            .into()),
            Some(path) => Self::load_from(path).await,
            None => {
                let cwd = std::env::current_dir().context("Failed to get current directory")?;
                Self::discover(&cwd).await
            }
        }
    }

    /// Load from `path`; relative levels resolve against its directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// sets unknown keys.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.levels = config
                .levels
                .into_iter()
                .map(|level| if level.is_relative() { base.join(level) } else { level })
                .collect();
        }
        if config.deps_suffixes.is_empty() {
            return Err(BemError::ConfigError {
                message: "deps_suffixes must name at least one suffix".to_string(),
            }
            .into());
        }

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolver options from these settings.
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            strict: self.strict,
            max_iterations: self.max_iterations,
        }
    }
}
