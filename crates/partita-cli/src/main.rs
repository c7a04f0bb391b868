//! Partita CLI - run and render the demo patch on the Partita graph executor.

mod commands;
mod modules;
mod patch;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "partita")]
#[command(author, version, about = "Partita audio graph executor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the demo patch (sine + square -> mixer) on an output device
    Play(commands::play::PlayArgs),

    /// Render the demo patch offline into a WAV file
    Render(commands::render::RenderArgs),

    /// List output devices
    Devices(commands::devices::DevicesArgs),

    /// Show or initialise the engine configuration
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
