//! Common test utilities for bemdeps integration tests

// Not every helper is used by every test file
#![allow(dead_code)]

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use bemdeps::decl::Declaration;
use bemdeps::loader::{LevelIndex, LevelLoader};
use bemdeps::resolver::{DepsResolver, ResolveOptions, Resolution};
use bemdeps::test_utils::{LevelFixture, init_test_logging};

/// A temporary BEM project with levels, declarations and a config file.
pub struct TestProject {
    fixture: LevelFixture,
}

impl TestProject {
    /// Create an empty project.
    pub fn new() -> Result<Self> {
        init_test_logging(None);
        Ok(Self {
            fixture: LevelFixture::new()?,
        })
    }

    /// Project root.
    pub fn dir(&self) -> &Path {
        self.fixture.root()
    }

    /// Path of a level directory, created if missing.
    pub fn level(&self, name: &str) -> PathBuf {
        self.fixture.level(name).expect("level directory can be created")
    }

    /// Write `<entity>.deps.json` into `level`.
    pub fn deps(&self, level: &str, entity: &str, content: &str) -> &Self {
        self.fixture.add_deps(level, entity, content).expect("deps file can be written");
        self
    }

    /// Write any entity file into `level`.
    pub fn entity_file(&self, level: &str, entity: &str, suffix: &str, content: &str) -> &Self {
        self.fixture
            .add_entity_file(level, entity, suffix, content)
            .expect("entity file can be written");
        self
    }

    /// Write a file relative to the project root.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        self.fixture.write(relative, content).expect("file can be written")
    }

    /// Resolve a declaration through the library against `levels`.
    pub async fn resolve(
        &self,
        levels: &[&str],
        declaration: &str,
        options: ResolveOptions,
    ) -> Result<Resolution> {
        let levels: Vec<PathBuf> = levels.iter().map(|l| self.level(l)).collect();
        let index = LevelIndex::scan(&levels)?;
        let declaration = Declaration::parse(Path::new("bundle.deps.json"), declaration)?;
        DepsResolver::new(LevelLoader::new(index), options).resolve(&declaration).await
    }

    /// Run the bemdeps binary in the project directory.
    pub fn run_bemdeps(&self, args: &[&str]) -> Result<CommandOutput> {
        let binary = env!("CARGO_BIN_EXE_bemdeps");
        let output = Command::new(binary)
            .args(args)
            .current_dir(self.dir())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .output()
            .context("Failed to run bemdeps")?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Keys of the resolved entities, in order.
pub fn keys(resolution: &Resolution) -> Vec<String> {
    resolution.entities().iter().map(|e| e.key()).collect()
}

/// Command output helper
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Assert the command succeeded
    pub fn assert_success(&self) -> &Self {
        assert!(self.success, "Command failed with code {:?}\nStderr: {}", self.code, self.stderr);
        self
    }

    /// Assert the command failed with exit code 1
    pub fn assert_failure(&self) -> &Self {
        assert_eq!(self.code, Some(1), "Expected exit code 1\nStdout: {}", self.stdout);
        self
    }

    /// Assert stdout contains the given text
    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Expected stdout to contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    /// Assert stderr contains the given text
    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Expected stderr to contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }

    /// Non-empty stdout lines
    pub fn stdout_lines(&self) -> Vec<&str> {
        self.stdout.lines().filter(|l| !l.trim().is_empty()).collect()
    }
}
