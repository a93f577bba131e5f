// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz catalog fingerprinting with arbitrary JSON tool lists.
//!
//! The fingerprint must ignore input order and the generated profile name
//! must stay usable as a file name.
#![no_main]
use dtg_core::{ToolCatalog, ToolDescriptor};
use dtg_profile::{FINGERPRINT_LEN, compute_fingerprint, generate_profile_name};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(serde_json::Value::Array(items)) = serde_json::from_slice(data) else {
        return;
    };
    let tools: Vec<ToolDescriptor> = items
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();

    let forward: ToolCatalog = tools.iter().cloned().collect();
    let reversed: ToolCatalog = tools.into_iter().rev().collect();

    let fp = compute_fingerprint(&forward);
    assert_eq!(fp.len(), FINGERPRINT_LEN);
    // Duplicate names keep the last insert, so only compare distinct catalogs.
    if forward == reversed {
        assert_eq!(fp, compute_fingerprint(&reversed));
    }

    let name = generate_profile_name(&forward);
    assert!(name.ends_with(&fp));
    assert!(!name.contains(['/', '\\', '\0']));
    assert!(!name.starts_with('.'));
});
