//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the remark binary.

mod classify;
mod commands;
mod delays;
mod show_config;

pub use classify::classify_text;
pub use commands::{Cli, Commands, DelayCommands, OutputFormat};
pub use delays::handle_delay_command;
pub use show_config::show_config;
