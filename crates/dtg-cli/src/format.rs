// SPDX-License-Identifier: MIT OR Apache-2.0
//! Output formatting for the `dtg` CLI and the detached tool server.

use dtg_core::{ToolCatalog, ToolOutcome};
use dtg_profile::ProfileSummary;
use std::fmt::Write;

/// Render an outcome the way a model-facing caller reads it.
///
/// The outcome's result or message is returned as is. An outcome with no
/// text falls back to the bare label.
#[must_use]
pub fn format_outcome(outcome: &ToolOutcome) -> String {
    match outcome.text() {
        "" => outcome.label().to_string(),
        text => text.to_string(),
    }
}

/// Aligned table of profiles, one per line.
#[must_use]
pub fn format_profile_table(profiles: &[ProfileSummary]) -> String {
    if profiles.is_empty() {
        return "no profiles\n".to_string();
    }
    let width = profiles
        .iter()
        .map(|p| p.name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<width$}  {:<12}  TOOLS", "NAME", "FINGERPRINT");
    for p in profiles {
        let _ = writeln!(
            out,
            "{:<width$}  {:<12}  {}",
            p.name, p.fingerprint, p.tool_count
        );
    }
    out
}

/// One line per tool: name, then description when present.
#[must_use]
pub fn format_catalog(catalog: &ToolCatalog) -> String {
    let mut out = String::new();
    for tool in catalog.iter() {
        if tool.description.is_empty() {
            let _ = writeln!(out, "{}", tool.name);
        } else {
            let _ = writeln!(out, "{}  {}", tool.name, tool.description);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtg_core::ToolDescriptor;
    use serde_json::json;

    #[test]
    fn success_text_is_bare() {
        assert_eq!(format_outcome(&ToolOutcome::success("42")), "42");
    }

    #[test]
    fn failure_text_is_bare() {
        assert_eq!(
            format_outcome(&ToolOutcome::error("device not connected")),
            "device not connected"
        );
        assert_eq!(
            format_outcome(&ToolOutcome::not_found("tool x does not exist")),
            "tool x does not exist"
        );
    }

    #[test]
    fn empty_text_falls_back_to_label() {
        assert_eq!(format_outcome(&ToolOutcome::success("")), "success");
        assert_eq!(format_outcome(&ToolOutcome::error("")), "error");
    }

    #[test]
    fn table_aligns_long_names() {
        let rows = vec![
            ProfileSummary {
                name: "a".into(),
                fingerprint: "0123456789ab".into(),
                tool_count: 1,
            },
            ProfileSummary {
                name: "lamp_2tools_0123456789ab".into(),
                fingerprint: "0123456789ab".into(),
                tool_count: 2,
            },
        ];
        let table = format_profile_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("NAME"));
        let column = lines[0].find("FINGERPRINT").unwrap();
        assert_eq!(&lines[1][column..column + 12], "0123456789ab");
        assert_eq!(&lines[2][column..column + 12], "0123456789ab");
    }

    #[test]
    fn catalog_lists_descriptions() {
        let catalog: ToolCatalog = vec![
            ToolDescriptor::new("b", json!({})),
            ToolDescriptor::new("a", json!({})).with_description("turns it on"),
        ]
        .into();
        assert_eq!(format_catalog(&catalog), "a  turns it on\nb\n");
    }
}
