//! HEXCRAWL CLI - Command-line harness for the rules engine
//!
//! Commands:
//! - simulate: Auto-play seeded runs of a scenario file
//! - level: Show the scenario level for a party

mod level;
mod simulate;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hexcrawl")]
#[command(about = "HEXCRAWL tactical combat rules harness")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Auto-play a scenario and report win rates
    Simulate(simulate::SimulateArgs),
    /// Show the scenario level and its derived numbers
    Level(level::LevelArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(args) => simulate::run(args),
        Commands::Level(args) => level::run(args),
    }
}
