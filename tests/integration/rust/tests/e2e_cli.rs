//! End-to-End CLI Integration Tests
//!
//! Tests the inspector through the bridge_cli API, from options to the
//! printed output.

use bindings::ContextOptions;
use bridge_cli::{describe, Inspector};
use value_bridge::TaggedValue;

/// Test: every exposed type appears once in the tree
#[test]
fn test_e2e_tree_lists_every_type() {
    let inspector = Inspector::new(ContextOptions::default()).expect("Should install");
    let tree = inspector.type_tree();
    for record in bindings::STANDARD_TYPES.iter() {
        let line = format!("{} ({})", record.name, record.class_id);
        assert_eq!(
            tree.lines().filter(|l| l.trim() == line).count(),
            1,
            "{} should appear once",
            record.name
        );
    }
}

/// Test: order JSON matches the plain order
#[test]
fn test_e2e_order_json_matches_order() {
    let inspector = Inspector::new(ContextOptions::default()).expect("Should install");
    let names: Vec<String> = inspector
        .install_order_json()
        .as_array()
        .expect("Should be an array")
        .iter()
        .map(|entry| entry["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, inspector.install_order());
}

/// Test: nested JSON keeps arrays as lists and objects as JSON
#[test]
fn test_e2e_convert_nested() {
    let mut inspector = Inspector::new(ContextOptions::default()).expect("Should install");
    let out = inspector
        .convert(r#"[{"x":[1,2]},"s",null,2.5]"#)
        .expect("Should convert");
    assert_eq!(out, r#"list [json {"x":[1,2]}, string "s", null, float64 2.5]"#);
}

/// Test: describe renders host-built values
#[test]
fn test_e2e_describe_host_values() {
    assert_eq!(describe(TaggedValue::from_bool(false)).unwrap(), "bool false");
    assert_eq!(
        describe(TaggedValue::from_list(vec![TaggedValue::null(), TaggedValue::from_i64(-3)]))
            .unwrap(),
        "list [null, int -3]"
    );
}
