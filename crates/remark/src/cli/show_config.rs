//! Effective configuration printer.

use remark::RemarkConfig;

/// Serialize `config` as TOML.
pub fn show_config(config: &RemarkConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(config)
}
