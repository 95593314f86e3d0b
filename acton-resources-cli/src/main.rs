//! acton-resources CLI tool

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod commands;

use acton_resources::observability::{self, LogFormat, ObservabilityConfig};
use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{CheckCommand, RoutesCommand};

#[derive(Parser)]
#[command(name = "acton-resources")]
#[command(version)]
#[command(about = "Inspect and validate acton-resources route tables", long_about = None)]
struct Cli {
    /// Log tree resolution and generation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the generated route table
    Routes(RoutesCommand),
    /// Validate controller declarations without printing routes
    Check(CheckCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "warn,acton_resources=debug"
    } else {
        "warn"
    };
    observability::init_with(
        &ObservabilityConfig::default()
            .with_default_filter(filter)
            .with_format(LogFormat::Compact),
    )?;

    match cli.command {
        Commands::Routes(cmd) => cmd.execute(),
        Commands::Check(cmd) => cmd.execute(),
    }
}
