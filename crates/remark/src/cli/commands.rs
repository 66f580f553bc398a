//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Remark - adaptive, multi-provider LLM request orchestration
#[derive(Parser, Debug)]
#[command(name = "remark")]
#[command(about = "Inspect and manage adaptive LLM request throttling", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (skips the layered lookup)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tuned per-model delays
    #[command(subcommand)]
    Delays(DelayCommands),

    /// Classify a provider error message
    Classify {
        /// Raw error text, as returned by the provider
        text: String,

        /// Model the failed call targeted (without provider prefix)
        #[arg(long)]
        model: Option<String>,

        /// The model is known to exist for the credential
        #[arg(long)]
        confirmed: bool,

        /// Comma-separated models available to the credential
        #[arg(long, value_delimiter = ',')]
        available: Option<Vec<String>>,

        /// Kind of call that failed
        #[arg(long, default_value = "generation")]
        phase: String,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Delay management subcommands
#[derive(Subcommand, Debug)]
pub enum DelayCommands {
    /// List current delays for every model seen so far
    List {
        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Restore base delays
    Reset {
        /// Only reset this model (provider:model); all models when omitted
        #[arg(long)]
        model: Option<String>,
    },
}

/// Output format for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table
    Human,
    /// JSON object keyed by model id
    Json,
}
