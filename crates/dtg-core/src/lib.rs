// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tool catalog types and collaborator contracts for the device tool gateway.
//!
//! A device that holds a live connection reports a set of tools, each
//! described by a [`ToolDescriptor`]. The gateway keeps those descriptors in
//! a [`ToolCatalog`], relays [`ToolCallRequest`]s to the device's
//! [`ToolClient`], and exposes the same capability to detached processes
//! through the [`ToolExecutor`] trait.
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Live per-device tool client contract.
pub mod client;
/// Device connections and the registry used to look them up.
pub mod connection;
/// Tool-invocation capability surface and its outcome type.
pub mod executor;

pub use client::{ToolClient, ToolInvokeError};
pub use connection::{ConnectionRegistry, DeviceConnection, InMemoryConnectionRegistry};
pub use executor::{ToolExecutor, ToolOutcome};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Argument key a caller may embed to route a relayed call to one device.
pub const DEVICE_ID_ARGUMENT: &str = "device_id";

// ---------------------------------------------------------------------------
// ToolDescriptor
// ---------------------------------------------------------------------------

/// Name, description, and input schema of one device tool.
///
/// Serialized with the `inputSchema` key devices use on the wire, so a
/// persisted profile can be written back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolDescriptor {
    /// Tool name, unique within a catalog.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// JSON Schema describing the tool's arguments.
    #[serde(rename = "inputSchema", default = "empty_object")]
    pub input_schema: Value,
    /// Any other fields the device reported (`outputSchema`,
    /// `annotations`, ...), kept so they round-trip unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolDescriptor {
    /// Create a descriptor with an empty description.
    pub fn new(name: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_schema,
            extra: Map::new(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

// ---------------------------------------------------------------------------
// ToolCatalog
// ---------------------------------------------------------------------------

/// A set of tool descriptors keyed by name.
///
/// Ordering never matters: the catalog is stored sorted by name and
/// serializes as a plain JSON array. A later descriptor with a duplicate
/// name replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ToolDescriptor>", into = "Vec<ToolDescriptor>")]
pub struct ToolCatalog {
    tools: BTreeMap<String, ToolDescriptor>,
}

impl ToolCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor, returning the one it replaced.
    pub fn insert(&mut self, tool: ToolDescriptor) -> Option<ToolDescriptor> {
        self.tools.insert(tool.name.clone(), tool)
    }

    /// Look up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// Whether a tool with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Iterate descriptors in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    /// Number of tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the catalog holds no tools.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl From<Vec<ToolDescriptor>> for ToolCatalog {
    fn from(tools: Vec<ToolDescriptor>) -> Self {
        tools.into_iter().collect()
    }
}

impl From<ToolCatalog> for Vec<ToolDescriptor> {
    fn from(catalog: ToolCatalog) -> Self {
        catalog.tools.into_values().collect()
    }
}

impl FromIterator<ToolDescriptor> for ToolCatalog {
    fn from_iter<I: IntoIterator<Item = ToolDescriptor>>(iter: I) -> Self {
        let mut catalog = ToolCatalog::new();
        for tool in iter {
            catalog.insert(tool);
        }
        catalog
    }
}

impl IntoIterator for ToolCatalog {
    type Item = ToolDescriptor;
    type IntoIter = std::collections::btree_map::IntoValues<String, ToolDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.tools.into_values()
    }
}

// ---------------------------------------------------------------------------
// Wire envelopes
// ---------------------------------------------------------------------------

/// Body of a relayed tool call (`POST /internal/tool/call`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolCallRequest {
    /// Name of the tool to invoke.
    pub tool_name: String,
    /// Tool arguments.
    #[serde(default)]
    pub arguments: Map<String, Value>,
    /// Optional device to target; any ready device is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

impl ToolCallRequest {
    /// Build a request with no explicit target device.
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            device_id: None,
        }
    }

    /// Build a request from caller arguments, lifting an embedded
    /// [`DEVICE_ID_ARGUMENT`] out of the arguments into `device_id`.
    ///
    /// Empty or non-string routing values are stripped but ignored.
    pub fn routed(tool_name: impl Into<String>, mut arguments: Map<String, Value>) -> Self {
        let device_id = match arguments.remove(DEVICE_ID_ARGUMENT) {
            Some(Value::String(id)) if !id.is_empty() => Some(id),
            _ => None,
        };
        Self {
            tool_name: tool_name.into(),
            arguments,
            device_id,
        }
    }
}

/// Per-connection entry in the device listing (`GET /internal/devices`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DeviceSummary {
    /// Identifier reported by the connection, if any.
    pub device_id: Option<String>,
    /// Whether a tool client is attached.
    pub has_mcp: bool,
    /// Whether the attached tool client reports ready.
    pub mcp_ready: bool,
    /// Tool names, populated only when ready.
    pub tools: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptor_uses_input_schema_wire_key() {
        let tool = ToolDescriptor::new("self.light.on", json!({"type": "object"}));
        let v = serde_json::to_value(&tool).unwrap();
        assert_eq!(v["inputSchema"]["type"], "object");
        assert!(v.get("input_schema").is_none());
    }

    #[test]
    fn descriptor_defaults_missing_fields() {
        let tool: ToolDescriptor = serde_json::from_value(json!({"name": "ping"})).unwrap();
        assert_eq!(tool.description, "");
        assert_eq!(tool.input_schema, json!({}));
    }

    #[test]
    fn descriptor_keeps_unknown_fields() {
        let raw = json!({
            "name": "self.lamp.get",
            "description": "read the lamp",
            "inputSchema": {"type": "object"},
            "outputSchema": {"type": "boolean"},
            "annotations": {"readOnlyHint": true}
        });
        let tool: ToolDescriptor = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(tool.extra["outputSchema"], json!({"type": "boolean"}));
        assert_eq!(serde_json::to_value(&tool).unwrap(), raw);
    }

    #[test]
    fn catalog_is_name_ordered_and_deduplicated() {
        let catalog: ToolCatalog = vec![
            ToolDescriptor::new("b", json!({})),
            ToolDescriptor::new("a", json!({})),
            ToolDescriptor::new("b", json!({"type": "object"})),
        ]
        .into();
        assert_eq!(catalog.names(), vec!["a", "b"]);
        assert_eq!(catalog.get("b").unwrap().input_schema, json!({"type": "object"}));
    }

    #[test]
    fn catalog_serializes_as_array() {
        let catalog: ToolCatalog = vec![ToolDescriptor::new("a", json!({}))].into();
        let v = serde_json::to_value(&catalog).unwrap();
        assert!(v.is_array());
        let back: ToolCatalog = serde_json::from_value(v).unwrap();
        assert_eq!(back, catalog);
    }

    #[test]
    fn routed_request_strips_device_id() {
        let args = json!({"brightness": 50, "device_id": "aa:bb"});
        let req = ToolCallRequest::routed("set_brightness", args.as_object().unwrap().clone());
        assert_eq!(req.device_id.as_deref(), Some("aa:bb"));
        assert!(!req.arguments.contains_key("device_id"));
        assert_eq!(req.arguments["brightness"], 50);
    }

    #[test]
    fn routed_request_ignores_non_string_device_id() {
        let args = json!({"device_id": 7});
        let req = ToolCallRequest::routed("ping", args.as_object().unwrap().clone());
        assert!(req.device_id.is_none());
        assert!(req.arguments.is_empty());
    }

    #[test]
    fn request_omits_absent_device_id() {
        let req = ToolCallRequest::new("ping", Map::new());
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("device_id").is_none());
        assert_eq!(v["arguments"], json!({}));
    }
}
