//! Resolve a declaration into an ordered dependency list.
//!
//! # Output formats
//!
//! - `text` (default): one entity key per line, broken cycles on stderr
//! - `json`: `{"deps": [...], "cycles": {"mustDeps": [...]}}`
//! - `bemdecl`: the ordered entities folded into `{"blocks": [...]}`

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Args;
use colored::Colorize;
use serde_json::json;

use super::CliConfig;
use super::common::{CommandContext, LevelArgs, read_declaration};
use crate::resolver::Resolution;

const FORMATS: [&str; 3] = ["text", "json", "bemdecl"];

/// Command to resolve a declaration.
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Bundle declaration (bemdecl or deps, JSON or YAML)
    #[arg(value_name = "DECL")]
    declaration: PathBuf,

    #[command(flatten)]
    levels: LevelArgs,

    /// Fail on must-dependency cycles instead of breaking them
    #[arg(long)]
    strict: bool,

    /// Output format (text, json, bemdecl)
    #[arg(short = 'f', long, default_value = "text")]
    format: String,
}

impl ResolveCommand {
    /// Execute the resolve command.
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        self.validate_arguments()?;

        let declaration = read_declaration(&self.declaration).await?;
        let context = CommandContext::load(cli, &self.levels).await?;
        let mut options = context.config.resolve_options();
        options.strict |= self.strict;

        let resolution = context.resolver(options).resolve(&declaration).await?;
        self.print(&resolution)
    }

    fn validate_arguments(&self) -> Result<()> {
        if !FORMATS.contains(&self.format.as_str()) {
            return Err(anyhow!(
                "Invalid format '{}'. Valid formats are: {}",
                self.format,
                FORMATS.join(", ")
            ));
        }
        Ok(())
    }

    fn print(&self, resolution: &Resolution) -> Result<()> {
        match self.format.as_str() {
            "json" => {
                let output = json!({
                    "deps": resolution.to_deps_json(),
                    "cycles": resolution.cycle_report(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            "bemdecl" => {
                let output = json!({ "blocks": resolution.to_bemdecl() });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                for entity in resolution.entities() {
                    println!("{entity}");
                }
                if !resolution.cycles.is_empty() {
                    eprintln!("{}", "Broken must-dependency cycles:".yellow().bold());
                    for cycle in &resolution.cycles {
                        eprintln!("  {cycle}");
                    }
                }
            }
        }
        Ok(())
    }
}
