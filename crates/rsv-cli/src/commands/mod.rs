//! Command handler modules for rsv-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod check;

use anyhow::{anyhow, Result};
use rsv_config::{CheckSettings, LoadedConfig, UnusedKeyPolicy};
use rsv_reconcile::report::ReportFormat;

/// Parse a `--format` / `/report/format` string into a [`ReportFormat`].
pub fn parse_report_format(format: &str) -> Result<ReportFormat> {
    format.parse::<ReportFormat>().map_err(|e| anyhow!(e))
}

/// Load layered config (if any paths were given) and extract check settings.
///
/// Unused keys are warned about, not fatal.
pub fn load_settings(config_paths: &[String]) -> Result<(CheckSettings, Option<LoadedConfig>)> {
    if config_paths.is_empty() {
        return Ok((CheckSettings::default(), None));
    }

    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = rsv_config::load_layered_yaml(&path_refs)?;
    rsv_config::report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    let settings = CheckSettings::from_config_json(&loaded.config_json)?;
    Ok((settings, Some(loaded)))
}
