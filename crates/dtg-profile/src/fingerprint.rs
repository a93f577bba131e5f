// SPDX-License-Identifier: MIT OR Apache-2.0
//! Order-independent identity for tool catalogs.

use dtg_core::ToolCatalog;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the SHA-256 digest.
pub const FINGERPRINT_LEN: usize = 12;

/// Longest readable prefix kept in a generated profile name.
const NAME_PREFIX_MAX: usize = 20;

/// Namespace prefix device tools conventionally carry.
const TOOL_NAMESPACE: &str = "self.";

/// Rebuild `value` with every object's keys in sorted order.
pub fn canonicalize_schema(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), canonicalize_schema(&map[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize_schema).collect()),
        other => other.clone(),
    }
}

/// Digest over the catalog's `(name, schema)` pairs.
///
/// Each pair becomes `[name, "<canonical schema json>"]`, the pairs are
/// ordered by name and serialized as one compact JSON array. The first
/// [`FINGERPRINT_LEN`] hex characters of its SHA-256 are returned.
/// Descriptions do not participate.
///
/// ```
/// use dtg_core::{ToolCatalog, ToolDescriptor};
/// use dtg_profile::compute_fingerprint;
/// use serde_json::json;
///
/// let a: ToolCatalog = vec![
///     ToolDescriptor::new("x", json!({"type": "object", "required": []})),
///     ToolDescriptor::new("y", json!({})),
/// ].into();
/// let b: ToolCatalog = vec![
///     ToolDescriptor::new("y", json!({})),
///     ToolDescriptor::new("x", json!({"required": [], "type": "object"})),
/// ].into();
/// assert_eq!(compute_fingerprint(&a), compute_fingerprint(&b));
/// ```
pub fn compute_fingerprint(catalog: &ToolCatalog) -> String {
    let mut pairs: Vec<(&str, String)> = catalog
        .iter()
        .map(|tool| {
            let schema = canonicalize_schema(&tool.input_schema).to_string();
            (tool.name.as_str(), schema)
        })
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let content = Value::Array(
        pairs
            .into_iter()
            .map(|(name, schema)| Value::Array(vec![Value::from(name), Value::from(schema)]))
            .collect(),
    )
    .to_string();

    let digest = format!("{:x}", Sha256::digest(content.as_bytes()));
    digest[..FINGERPRINT_LEN].to_string()
}

/// Readable, deterministic profile name for `catalog`.
///
/// `"empty_{fp}"` for an empty catalog, otherwise
/// `"{prefix}_{count}tools_{fp}"` where `prefix` comes from the
/// lexicographically first tool name with the `self.` namespace removed,
/// cut at the first `.`, non-alphanumerics mapped to `_`, and bounded to
/// 20 characters.
pub fn generate_profile_name(catalog: &ToolCatalog) -> String {
    let fingerprint = compute_fingerprint(catalog);
    let first = catalog.names().into_iter().find(|n| !n.is_empty());
    let Some(first) = first else {
        return if catalog.is_empty() {
            format!("empty_{fingerprint}")
        } else {
            format!("tools_{}tools_{fingerprint}", catalog.len())
        };
    };

    let stripped = first.strip_prefix(TOOL_NAMESPACE).unwrap_or(first.as_str());
    let segment = stripped.split('.').next().unwrap_or_default();
    let prefix: String = segment
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .take(NAME_PREFIX_MAX)
        .collect();

    format!("{prefix}_{}tools_{fingerprint}", catalog.len())
}
