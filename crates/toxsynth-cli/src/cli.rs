//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// toxsynth: evidence synthesis for nonclinical toxicology studies
#[derive(Parser)]
#[command(name = "toxsynth")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synthesize a study and print the organ evidence summary
    Analyze {
        /// Study document (.json) or long-format dose table (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the full report as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the full report as JSON instead of the summary
        #[arg(long)]
        json: bool,

        /// Analyze scheduled-sacrifice subjects only
        #[arg(long)]
        scheduled_only: bool,

        /// Synthesis configuration overrides (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show the study NOAEL per sex with its driving organ and endpoint
    Noael {
        /// Study document (.json) or long-format dose table (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Analyze scheduled-sacrifice subjects only
        #[arg(long)]
        scheduled_only: bool,

        /// Synthesis configuration overrides (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
