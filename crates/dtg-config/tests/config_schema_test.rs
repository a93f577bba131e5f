// SPDX-License-Identifier: MIT OR Apache-2.0

use dtg_config::GatewayConfig;
use schemars::schema_for;
use serde_json::json;

fn config_schema() -> serde_json::Value {
    let schema = schema_for!(GatewayConfig);
    serde_json::to_value(schema).expect("schema to value")
}

#[test]
fn config_schema_is_generated() {
    let schema = config_schema();
    assert_eq!(
        schema.get("$schema").and_then(|v| v.as_str()),
        Some("https://json-schema.org/draft/2020-12/schema"),
    );
    let props = schema.get("properties").expect("properties");
    for section in ["server", "tools", "tool_server"] {
        assert!(props.get(section).is_some(), "missing section {section}");
    }
}

#[test]
fn example_config_validates_against_schema() {
    let schema = config_schema();
    let instance = json!({
        "server": {
            "ip": "0.0.0.0",
            "http_port": 8003,
            "internal_api_key": "shared",
            "trusted_proxy_ips": ["192.168.1.20"]
        },
        "tools": { "call_timeout_secs": 30, "proxy_timeout_secs": 35 }
    });
    let validator = jsonschema::validator_for(&schema).expect("compile schema");
    assert!(validator.is_valid(&instance));
}

#[test]
fn invalid_config_fails_schema_validation() {
    let schema = config_schema();
    let instance = json!({ "server": { "http_port": "eighty" } });
    let validator = jsonschema::validator_for(&schema).expect("compile schema");
    assert!(!validator.is_valid(&instance));
}

#[test]
fn default_config_serializes_into_valid_instance() {
    let schema = config_schema();
    let instance = serde_json::to_value(GatewayConfig::default()).unwrap();
    let validator = jsonschema::validator_for(&schema).expect("compile schema");
    assert!(validator.is_valid(&instance));
}
