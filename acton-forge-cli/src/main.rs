//! acton-forge CLI tool

#![allow(clippy::cognitive_complexity)]

mod commands;
mod console_ui;

use std::path::PathBuf;

use acton_forge::observability::{self, ObservabilityConfig};
use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{GenerateCommand, InspectCommand, TemplatesCommand};

#[derive(Parser)]
#[command(name = "acton-forge")]
#[command(version)]
#[command(about = "Generate DTOs, validators, serializers and controllers from your schema", long_about = None)]
struct Cli {
    /// Project root (where `acton-forge.toml` and `src/` live)
    #[arg(short = 'C', long, global = true, default_value = ".")]
    project: PathBuf,

    /// Log debug-level events
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate artifacts for one or more entities
    Generate(GenerateCommand),
    /// Show what introspection and detection find for an entity
    Inspect(InspectCommand),
    /// Inspect and customize the artifact templates
    Templates {
        #[command(subcommand)]
        command: TemplatesCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    observability::init(&ObservabilityConfig::default().with_verbose(cli.verbose));

    match cli.command {
        Commands::Generate(command) => command.execute(&cli.project)?,
        Commands::Inspect(command) => command.execute(&cli.project)?,
        Commands::Templates { command } => command.execute(&cli.project)?,
    }

    Ok(())
}
