//! toxsynth CLI - evidence synthesis for toxicology studies.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Analyze {
            file,
            output,
            json,
            scheduled_only,
            config,
        } => commands::analyze::run(file, output, json, scheduled_only, config, cli.verbose),

        Commands::Noael {
            file,
            scheduled_only,
            config,
        } => commands::noael::run(file, scheduled_only, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
