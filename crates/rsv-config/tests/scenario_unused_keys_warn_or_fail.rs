use rsv_config::{
    load_layered_yaml_from_strings, report_unused_keys, CheckSettings, UnusedKeyPolicy,
};

/// Validates:
/// 1) Unused keys are detected in WARN mode but do not error.
/// 2) Unused keys cause failure in FAIL mode.
/// 3) Every key CheckSettings reads is in the consumed registry.
/// 4) Deterministic ordering of unused pointers.

#[test]
fn warn_mode_reports_unused_keys_without_error() {
    let yaml = r#"
snapshot:
  dir: "./snap"
  block: 1200

rpc:
  url: "wss://example.invalid"
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert!(!report.is_clean());
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/rpc/url".to_string(), "/snapshot/block".to_string()]
    );
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let yaml = r#"
report:
  format: text
  colour: true
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let result = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail);

    let msg = format!("{:?}", result.expect_err("fail policy must error"));
    assert!(msg.contains("CONFIG_UNUSED_KEYS"));
    assert!(msg.contains("/report/colour"));
}

#[test]
fn full_check_config_is_clean() {
    let yaml = r#"
snapshot:
  dir: "./snap"
  network: "moonbase"
  at: 1200
report:
  format: "json"
  fail_on_deficit: false
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail)
        .expect("every key read by CheckSettings must be registered");
    assert!(report.is_clean());

    let s = CheckSettings::from_config_json(&loaded.config_json).unwrap();
    assert_eq!(s.at, Some(1200));
    assert_eq!(s.fail_on_deficit, Some(false));
}

#[test]
fn deterministic_unused_pointer_ordering() {
    let yaml = r#"
unused:
  b: 2
  a: 1
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/unused/a".to_string(), "/unused/b".to_string()]
    );
}
