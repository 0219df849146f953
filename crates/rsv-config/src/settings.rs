use anyhow::{bail, Result};
use serde_json::Value;

/// Settings read by `rsv check`. Every field is optional in config; the CLI
/// layers its own flags on top and supplies defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSettings {
    pub snapshot_dir: Option<String>,
    pub network: Option<String>,
    pub at: Option<u64>,
    pub format: Option<String>,
    pub fail_on_deficit: Option<bool>,
}

impl CheckSettings {
    const SNAPSHOT_DIR: &'static str = "/snapshot/dir";
    const SNAPSHOT_NETWORK: &'static str = "/snapshot/network";
    const SNAPSHOT_AT: &'static str = "/snapshot/at";
    const REPORT_FORMAT: &'static str = "/report/format";
    const REPORT_FAIL_ON_DEFICIT: &'static str = "/report/fail_on_deficit";

    /// Pointers read by [`from_config_json`](Self::from_config_json).
    pub const POINTERS: &'static [&'static str] = &[
        Self::SNAPSHOT_DIR,
        Self::SNAPSHOT_NETWORK,
        Self::SNAPSHOT_AT,
        Self::REPORT_FORMAT,
        Self::REPORT_FAIL_ON_DEFICIT,
    ];

    /// Extract settings from merged config JSON. A key present with the wrong
    /// type is an error, not a silent default.
    pub fn from_config_json(v: &Value) -> Result<Self> {
        Ok(Self {
            snapshot_dir: opt_str(v, Self::SNAPSHOT_DIR)?,
            network: opt_str(v, Self::SNAPSHOT_NETWORK)?,
            at: opt_u64(v, Self::SNAPSHOT_AT)?,
            format: opt_str(v, Self::REPORT_FORMAT)?,
            fail_on_deficit: opt_bool(v, Self::REPORT_FAIL_ON_DEFICIT)?,
        })
    }
}

fn opt_str(v: &Value, ptr: &str) -> Result<Option<String>> {
    match v.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => bail!("CONFIG_TYPE_ERROR {ptr}: expected string, got {other}"),
    }
}

fn opt_u64(v: &Value, ptr: &str) -> Result<Option<u64>> {
    match v.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(u) => Ok(Some(u)),
            None => bail!("CONFIG_TYPE_ERROR {ptr}: expected non-negative integer, got {n}"),
        },
        Some(other) => bail!("CONFIG_TYPE_ERROR {ptr}: expected non-negative integer, got {other}"),
    }
}

fn opt_bool(v: &Value, ptr: &str) -> Result<Option<bool>> {
    match v.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => bail!("CONFIG_TYPE_ERROR {ptr}: expected bool, got {other}"),
    }
}
