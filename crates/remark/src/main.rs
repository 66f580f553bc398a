//! Remark CLI binary.
//!
//! This binary provides command-line access to remark's throttling state:
//! - List and reset tuned per-model delays
//! - Classify provider error messages
//! - Print the effective configuration

use clap::Parser;
use remark::{LoggingConfig, RemarkConfig, init_logging_with_config};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, classify_text, handle_delay_command, show_config};

    // Load .env before anything reads the environment
    let _ = dotenvy::dotenv();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing
    let logging = if cli.verbose {
        LoggingConfig::new().with_log_level("debug")
    } else {
        LoggingConfig::new()
    };
    init_logging_with_config(logging.with_json_logs(cli.json_logs))?;

    let config = match &cli.config {
        Some(path) => RemarkConfig::from_file(path)?,
        None => RemarkConfig::load()?,
    };

    // Execute the requested command
    match cli.command {
        Commands::Delays(delay_cmd) => {
            handle_delay_command(delay_cmd, &config)?;
        }

        Commands::Classify {
            text,
            model,
            confirmed,
            available,
            phase,
        } => {
            let report = classify_text(
                &text,
                model.as_deref(),
                confirmed,
                available.as_deref(),
                &phase,
            )?;
            print!("{}", report);
        }

        Commands::Config => {
            print!("{}", show_config(&config)?);
        }
    }

    Ok(())
}
