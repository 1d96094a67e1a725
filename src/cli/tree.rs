//! Display the dependency tree of a declaration.
//!
//! ```text
//! page
//! ├── [must] i-reset
//! └── [should] page__header
//!     └── [must] link
//! ```
//!
//! Entities reached again are marked `(already shown)` instead of being
//! expanded twice. The tree shows the graph before cycle breaking, so
//! must-cycles are listed underneath. Entities only named by edges that a
//! `noDeps` later removed are not counted.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::{CommandContext, LevelArgs, read_declaration};

/// Command to display a dependency tree.
#[derive(Args, Debug)]
pub struct TreeCommand {
    /// Bundle declaration (bemdecl or deps, JSON or YAML)
    #[arg(value_name = "DECL")]
    declaration: PathBuf,

    #[command(flatten)]
    levels: LevelArgs,
}

impl TreeCommand {
    /// Execute the tree command.
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let declaration = read_declaration(&self.declaration).await?;
        let context = CommandContext::load(cli, &self.levels).await?;
        let options = context.config.resolve_options();
        let graph = context.resolver(options).expand(&declaration).await?;

        if graph.is_empty() {
            println!("No entities declared.");
            return Ok(());
        }

        print!("{}", graph.to_tree_string());
        println!();
        println!(
            "{} entities, {} edges",
            graph.reachable().len().to_string().cyan(),
            graph.reachable_edge_count().to_string().cyan()
        );

        let cycles = graph.must_cycles();
        if !cycles.is_empty() {
            println!("{}", "Must-dependency cycles:".yellow().bold());
            for cycle in cycles {
                let keys: Vec<String> = cycle.iter().map(|e| e.key()).collect();
                println!("  {}", keys.join(", "));
            }
        }
        Ok(())
    }
}
