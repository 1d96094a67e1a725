//! List the entities found in the levels.

use anyhow::{Result, anyhow};
use clap::Args;
use colored::Colorize;
use serde_json::json;

use super::CliConfig;
use super::common::{CommandContext, LevelArgs};

/// Command to list indexed entities.
#[derive(Args, Debug)]
pub struct IndexCommand {
    #[command(flatten)]
    levels: LevelArgs,

    /// Output format (text, json)
    #[arg(short = 'f', long, default_value = "text")]
    format: String,
}

impl IndexCommand {
    /// Execute the index command.
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        if !matches!(self.format.as_str(), "text" | "json") {
            return Err(anyhow!("Invalid format '{}'. Valid formats are: text, json", self.format));
        }

        let context = CommandContext::load(cli, &self.levels).await?;
        let index = &context.index;

        if self.format == "json" {
            let entities: Vec<_> = index
                .entities()
                .into_iter()
                .map(|(entity, files)| {
                    json!({
                        "entity": entity.key(),
                        "files": files.iter().map(|f| f.path.display().to_string()).collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entities)?);
            return Ok(());
        }

        if index.is_empty() {
            println!("No entities found.");
            return Ok(());
        }
        for (entity, files) in index.entities() {
            println!("{}", entity.key().bold());
            for file in files {
                println!("  {} {}", file.suffix.cyan(), file.path.display());
            }
        }
        println!();
        println!("{} entities in {} level(s)", index.len(), index.levels().len());
        Ok(())
    }
}
