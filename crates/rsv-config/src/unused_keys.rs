//! Unused-key guard.
//!
//! Consumed keys are JSON-pointer prefixes. A leaf of the merged config is
//! consumed when some prefix covers it on a segment boundary; every other
//! leaf is unused (usually a typo such as `/snapshot/block` for
//! `/snapshot/at`).

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::settings::CheckSettings;

/// Every pointer read anywhere in the workspace.
pub const CONSUMED_POINTERS: &[&str] = CheckSettings::POINTERS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Sorted, unique.
    pub consumed_prefixes: Vec<String>,
    /// Sorted, unique.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Compare the leaves of `config_json` against [`CONSUMED_POINTERS`].
///
/// `Warn` logs each unused key and returns the report. `Fail` turns any
/// unused key into an error.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let mut consumed_prefixes: Vec<String> =
        CONSUMED_POINTERS.iter().map(|p| normalize_pointer(p)).collect();
    consumed_prefixes.sort();
    consumed_prefixes.dedup();

    let mut unused_leaf_pointers: Vec<String> = leaf_pointers(config_json)
        .into_iter()
        .filter(|leaf| !consumed_prefixes.iter().any(|p| covers(p, leaf)))
        .collect();
    unused_leaf_pointers.sort();
    unused_leaf_pointers.dedup();

    let report = UnusedKeyReport {
        consumed_prefixes,
        unused_leaf_pointers,
    };
    if report.is_clean() {
        return Ok(report);
    }

    match policy {
        UnusedKeyPolicy::Fail => {
            let shown: Vec<&String> = report.unused_leaf_pointers.iter().take(12).collect();
            bail!(
                "CONFIG_UNUSED_KEYS: {} unused config leaf key(s) detected. \
                 Remove them or fix the spelling. First few: {:?}",
                report.unused_leaf_pointers.len(),
                shown
            )
        }
        UnusedKeyPolicy::Warn => {
            for p in &report.unused_leaf_pointers {
                tracing::warn!(pointer = %p, "unused config key");
            }
            Ok(report)
        }
    }
}

/// Leading `/`, no trailing `/` (except the root pointer itself).
fn normalize_pointer(p: &str) -> String {
    let trimmed = p.trim().trim_matches('/');
    format!("/{trimmed}")
}

/// `/a/b` covers `/a/b` and `/a/b/c` but not `/a/bc`. `/` covers all.
fn covers(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match leaf.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// All leaf pointers, walking objects and arrays iteratively.
fn leaf_pointers(root: &Value) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack: Vec<(String, &Value)> = vec![(String::new(), root)];

    while let Some((path, v)) = stack.pop() {
        match v {
            Value::Object(map) => {
                for (k, child) in map {
                    stack.push((format!("{path}/{}", escape_token(k)), child));
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    stack.push((format!("{path}/{i}"), child));
                }
            }
            _ if path.is_empty() => out.push("/".to_string()),
            _ => out.push(path),
        }
    }
    out
}

/// RFC 6901 token escaping.
fn escape_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}
