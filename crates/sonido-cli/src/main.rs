//! Sonido CLI - command-line demo harness for the audio stream engine.

mod commands;
mod wav;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sonido")]
#[command(author, version, about = "Sonido audio stream engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a WAV file's format, channel count, and/or sample rate
    Convert(commands::convert::ConvertArgs),

    /// Display a WAV file's format, channel count, and sample rate
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    tracing::debug!(command = ?std::mem::discriminant(&cli.command), "dispatching command");

    match cli.command {
        Commands::Convert(args) => commands::convert::run(args),
        Commands::Info(args) => commands::info::run(args),
    }
}
