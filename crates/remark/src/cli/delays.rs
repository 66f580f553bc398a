//! Delay listing and reset handlers.

use super::{DelayCommands, OutputFormat};
use remark::{DelayRecord, ModelId, Remark, RemarkConfig};
use std::fmt::Write as _;
use tracing::info;

/// Execute a delay management command.
pub fn handle_delay_command(
    command: DelayCommands,
    config: &RemarkConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let governor = Remark::open_governor(config);

    match command {
        DelayCommands::List { format } => {
            let record = governor.tuned_delays();
            match format {
                OutputFormat::Human => print!("{}", render_delays(&record, config)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
            }
        }
        DelayCommands::Reset { model } => {
            let model = model.map(|m| m.parse::<ModelId>()).transpose()?;
            governor.reset_adaptive(model.as_ref());
            match model {
                Some(model) => {
                    info!(model = %model, "Reset adaptive delay");
                    println!("Reset delay for {}", model);
                }
                None => println!("Reset all adaptive delays"),
            }
        }
    }

    Ok(())
}

/// Render delays as an aligned table.
pub fn render_delays(record: &DelayRecord, config: &RemarkConfig) -> String {
    if record.is_empty() {
        return "No tuned delays yet.\n".to_string();
    }

    let bases = config.base_delays();
    let width = record
        .keys()
        .map(|id| id.to_string().len())
        .max()
        .unwrap_or(0)
        .max("MODEL".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<width$}  {:>10}  {:>10}  {:>10}",
        "MODEL", "CURRENT", "BASE", "MAX"
    );
    for (id, current) in record {
        let base = bases.for_model(id);
        let max = base.saturating_mul(config.governor.max_backoff_multiplier);
        let _ = writeln!(
            out,
            "{:<width$}  {:>8}ms  {:>8}ms  {:>8}ms",
            id.to_string(),
            current,
            base,
            max
        );
    }
    out
}
