//! Command structures and arg parsing (spec §3 "CLI").

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute the full pipeline for an analysis request file
    Run {
        /// Path to the `AnalysisRequest` JSON/YAML file
        request: PathBuf,
        /// Directory to write per-day artifacts and the run manifest into
        #[arg(short, long)]
        out: PathBuf,
        /// Worker thread count; 0 auto-detects (spec §6.1)
        #[arg(long, default_value = "0")]
        threads: usize,
    },
    /// Load and validate a request and its static course/participant files
    /// without running binning, flow, or aggregation
    Validate {
        /// Path to the `AnalysisRequest` JSON/YAML file
        request: PathBuf,
    },
    /// Print course and participant summary statistics
    Inspect {
        /// Path to the `AnalysisRequest` JSON/YAML file
        request: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Inspect the local environment and report common setup issues
    Doctor {},
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
