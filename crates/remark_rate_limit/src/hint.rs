//! Retry-after hints embedded in provider error text.
//!
//! Vendors put the hint in different places: OpenAI says "Please try again in
//! 20s", Gemini says "Please retry in 3.0s" and repeats it as a JSON
//! `"retryDelay": "3s"`, proxies forward a raw `Retry-After: 12` header line.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static PHRASE_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:retry[\s_-]*(?:in|after)|try\s+again\s+in)\s*:?\s*(\d+(?:\.\d+)?)\s*(minutes?|mins?|ms|milliseconds?|s|secs?|seconds?)?",
    )
    .expect("retry phrase pattern is valid")
});

static FIELD_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)retry_?delay"?\s*[:=]\s*"?(\d+(?:\.\d+)?)\s*(ms|s)?"#)
        .expect("retry field pattern is valid")
});

/// Extract a retry-after duration from free-form error text.
///
/// Bare numbers are seconds. Returns `None` when the text has no hint.
///
/// # Examples
///
/// ```
/// use remark_rate_limit::parse_retry_after;
/// use std::time::Duration;
///
/// assert_eq!(parse_retry_after("429 Please retry in 3.0s"), Some(Duration::from_secs(3)));
/// assert_eq!(parse_retry_after("Please try again in 120ms."), Some(Duration::from_millis(120)));
/// assert_eq!(parse_retry_after("invalid api key"), None);
/// ```
pub fn parse_retry_after(text: &str) -> Option<Duration> {
    let captures = PHRASE_HINT
        .captures(text)
        .or_else(|| FIELD_HINT.captures(text))?;

    let value: f64 = captures.get(1)?.as_str().parse().ok()?;
    let unit = captures
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default();

    let millis = if unit.starts_with("mi") && !unit.starts_with("mil") {
        value * 60_000.0
    } else if unit == "ms" || unit.starts_with("mil") {
        value
    } else {
        value * 1000.0
    };

    if !millis.is_finite() || millis < 0.0 {
        return None;
    }
    Some(Duration::from_micros((millis * 1000.0).round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_retry_delay_field() {
        let text = r#"{"error": {"code": 429, "details": [{"retryDelay": "23s"}]}}"#;
        assert_eq!(parse_retry_after(text), Some(Duration::from_secs(23)));
    }

    #[test]
    fn retry_after_header_line() {
        assert_eq!(
            parse_retry_after("HTTP 429 error: Retry-After: 12"),
            Some(Duration::from_secs(12))
        );
    }

    #[test]
    fn long_form_units() {
        assert_eq!(
            parse_retry_after("rate limited, retry after 30 seconds"),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            parse_retry_after("Quota exceeded. Retry in 2 minutes"),
            Some(Duration::from_secs(120))
        );
        assert_eq!(
            parse_retry_after("retry in 1500 milliseconds"),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn fractional_seconds() {
        assert_eq!(
            parse_retry_after("Please try again in 1.5s"),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn no_hint_without_number() {
        assert_eq!(parse_retry_after("please retry later"), None);
        assert_eq!(parse_retry_after("429 Too Many Requests"), None);
    }
}
