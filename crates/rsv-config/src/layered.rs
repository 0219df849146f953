use std::fs;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Merged configuration plus its identity.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Lowercase hex SHA-256 of `canonical_json`.
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

/// Read and merge YAML files in order (base first, overrides last).
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}")))
        .collect::<Result<Vec<String>>>()?;

    let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Map::new());

    for (i, raw) in yaml_docs.iter().enumerate() {
        let doc: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml (layer {i})"))?;
        let doc = serde_json::to_value(doc)
            .with_context(|| format!("yaml->json conversion failed (layer {i})"))?;
        // An empty file parses as null and overrides nothing.
        if !doc.is_null() {
            overlay(&mut merged, doc);
        }
    }

    let canonical_json = canonical_json(&merged)?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));

    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge key by key; any other value replaces what was there.
fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base_map), Value::Object(top_map)) => {
            for (key, top_val) in top_map {
                match base_map.get_mut(&key) {
                    Some(base_val) => overlay(base_val, top_val),
                    None => {
                        base_map.insert(key, top_val);
                    }
                }
            }
        }
        (slot, top) => *slot = top,
    }
}

/// serde_json's default `Map` is ordered by key, so serializing it is
/// already canonical regardless of YAML key order.
fn canonical_json(v: &Value) -> Result<String> {
    serde_json::to_string(v).context("canonical json serialize failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_replaces_leaves_and_keeps_siblings() {
        let mut base = json!({ "snapshot": { "dir": "a", "network": "moonbase" } });
        overlay(&mut base, json!({ "snapshot": { "dir": "b" } }));
        assert_eq!(
            base,
            json!({ "snapshot": { "dir": "b", "network": "moonbase" } })
        );
    }

    #[test]
    fn scalar_replaces_object() {
        let mut base = json!({ "report": { "format": "text" } });
        overlay(&mut base, json!({ "report": "off" }));
        assert_eq!(base, json!({ "report": "off" }));
    }

    #[test]
    fn empty_layer_is_a_no_op() {
        let a = load_layered_yaml_from_strings(&["report:\n  format: json\n"]).unwrap();
        let b = load_layered_yaml_from_strings(&["report:\n  format: json\n", ""]).unwrap();
        assert_eq!(a.config_hash, b.config_hash);
    }

    #[test]
    fn no_layers_hash_the_empty_object() {
        let loaded = load_layered_yaml_from_strings(&[]).unwrap();
        assert_eq!(loaded.canonical_json, "{}");
    }
}
