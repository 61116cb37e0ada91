//! dysni CLI - incremental duplicate detection over CSV datasets.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod evaluate;
mod record;

use commands::{EvaluateCommand, ResolveCommand};

/// dysni CLI - incremental duplicate detection over CSV datasets.
///
/// Records are read one at a time and matched against earlier records
/// through dynamic sorted neighborhood indexes. Found pairs can then be
/// scored against a ground truth.
#[derive(Parser)]
#[command(name = "dysni")]
#[command(about = "Dynamic sorted neighborhood entity resolution")]
#[command(version)]
pub struct Cli {
    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve every record of a CSV file
    Resolve(ResolveCommand),
    /// Score found pairs against a ground truth
    Evaluate(EvaluateCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Resolve(cmd) => cmd.run(&cli),
        Commands::Evaluate(cmd) => cmd.run(&cli),
    }
}
