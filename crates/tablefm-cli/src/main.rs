//! tablefm CLI - render FM patches to WAV files.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tablefm")]
#[command(author, version, about = "Table-driven FM synthesizer CLI", long_about = None)]
struct Cli {
    /// Log engine activity at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one note of a patch through the four-slot router
    Render(commands::render::RenderArgs),

    /// Render a chord on the backing voice pool
    Chord(commands::chord::ChordArgs),

    /// List, show and export patches
    Patches(commands::patches::PatchesArgs),

    /// Describe the routing algorithms
    Algorithms,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Chord(args) => commands::chord::run(args),
        Commands::Patches(args) => commands::patches::run(args),
        Commands::Algorithms => commands::algorithms::run(),
    }
}
