//! yard CLI tool.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "yard")]
#[command(about = "Validate and plan yard blueprints", long_about = None)]
struct Cli {
    /// Directory holding generated state such as kubeconfigs
    #[arg(long, global = true, env = "YARD_STATE_DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a blueprint folder
    Validate {
        /// Path to the blueprint folder
        #[arg(default_value = ".")]
        folder: PathBuf,
    },
    /// Show the order resources would be applied in
    Plan {
        /// Path to the blueprint folder
        #[arg(default_value = ".")]
        folder: PathBuf,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the dependency graph in Graphviz DOT format
    Graph {
        /// Path to the blueprint folder
        #[arg(default_value = ".")]
        folder: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = commands::eval_context(cli.state_dir);

    match cli.command {
        Commands::Validate { folder } => {
            commands::validate(&folder, &ctx)?;
        }
        Commands::Plan { folder, json } => {
            commands::plan(&folder, &ctx, json)?;
        }
        Commands::Graph { folder } => {
            commands::graph(&folder, &ctx)?;
        }
    }

    Ok(())
}
