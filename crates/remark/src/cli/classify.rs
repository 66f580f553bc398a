//! Error classification handler.

use remark::{CallPhase, ClassifyContext, FailureClassifier, parse_retry_after};
use std::fmt::Write as _;

/// Classify `text` and describe the result.
pub fn classify_text(
    text: &str,
    model: Option<&str>,
    confirmed: bool,
    available: Option<&[String]>,
    phase: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let phase: CallPhase = phase
        .parse()
        .map_err(|_| format!("Unknown phase '{}' (expected listing or generation)", phase))?;

    let mut ctx = match (phase, model) {
        (CallPhase::Generation, Some(model)) => ClassifyContext::generation(model),
        (CallPhase::Generation, None) => ClassifyContext::default(),
        (CallPhase::Listing, _) => ClassifyContext::listing(),
    };
    ctx = ctx.confirmed(confirmed);
    if let Some(available) = available {
        ctx = ctx.with_available(available);
    }

    let class = FailureClassifier::new().classify(text, &ctx);

    let mut out = String::new();
    writeln!(out, "class:    {}", class)?;
    writeln!(out, "throttle: {}", if class.is_throttling() { "yes" } else { "no" })?;
    if let Some(hint) = parse_retry_after(text) {
        writeln!(out, "retry:    {}ms", hint.as_millis())?;
    }
    writeln!(out, "guidance: {}", class.guidance())?;
    Ok(out)
}
