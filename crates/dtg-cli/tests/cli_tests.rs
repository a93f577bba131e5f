// SPDX-License-Identifier: MIT OR Apache-2.0
//! Integration tests for the `dtg` CLI binary.

use assert_cmd::Command;
use dtg_auth::TokenSigner;
use dtg_core::{ToolCatalog, ToolDescriptor};
use dtg_profile::{ProfileStore, SaveMode};
use predicates::str::contains;
use serde_json::json;

fn dtg() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("dtg").expect("binary `dtg` should be built");
    for var in [
        "DTG_TOOL_PROXY_HOST",
        "DTG_INTERNAL_API_KEY",
        "DTG_AUTH_KEY",
        "DTG_PROFILES_DIR",
        "DTG_LOG_LEVEL",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn seeded_profiles() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = ProfileStore::new(dir.path());
    let lamp: ToolCatalog = vec![
        ToolDescriptor::new("self.lamp.on", json!({"type": "object"}))
            .with_description("Turn the lamp on"),
        ToolDescriptor::new("self.lamp.off", json!({"type": "object"})),
    ]
    .into();
    store.save(&lamp, SaveMode::Named("lamp")).unwrap();
    dir
}

// ── Help & version ──────────────────────────────────────────────────

#[test]
fn help_flag_prints_usage() {
    dtg()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Device tool gateway CLI"))
        .stdout(contains("tools"))
        .stdout(contains("token"))
        .stdout(contains("profiles"));
}

#[test]
fn version_flag_prints_version() {
    dtg()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

// ── Token ───────────────────────────────────────────────────────────

#[test]
fn token_is_verifiable_with_key() {
    let out = dtg()
        .args(["token", "--subject", "kitchen-speaker", "--auth-key", "k3y"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let token = String::from_utf8(out).unwrap();
    let claims = TokenSigner::new("k3y").unwrap().verify(token.trim()).unwrap();
    assert_eq!(claims.sub, "kitchen-speaker");
}

#[test]
fn token_reads_key_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("gateway.toml");
    std::fs::write(&cfg, "[server]\nauth_key = \"from-file\"\n").unwrap();

    let out = dtg()
        .args(["--config", cfg.to_str().unwrap(), "token", "--subject", "s"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let token = String::from_utf8(out).unwrap();
    assert!(TokenSigner::new("from-file").unwrap().verify(token.trim()).is_ok());
}

#[test]
fn token_without_key_fails() {
    dtg()
        .args(["token", "--subject", "s"])
        .assert()
        .failure()
        .stderr(contains("no signing key"));
}

// ── Profiles ────────────────────────────────────────────────────────

#[test]
fn profiles_list_shows_name_and_count() {
    let dir = seeded_profiles();
    dtg()
        .args(["profiles", "list", "--dir", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("FINGERPRINT"))
        .stdout(contains("lamp"))
        .stdout(contains("2"));
}

#[test]
fn profiles_list_on_empty_dir() {
    let dir = tempfile::tempdir().unwrap();
    dtg()
        .args(["profiles", "list", "--dir", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("no profiles"));
}

#[test]
fn profiles_show_prints_tools() {
    let dir = seeded_profiles();
    dtg()
        .args(["profiles", "show", "lamp", "--dir", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("self.lamp.off"))
        .stdout(contains("self.lamp.on  Turn the lamp on"));
}

#[test]
fn profiles_show_json_uses_wire_keys() {
    let dir = seeded_profiles();
    dtg()
        .args([
            "profiles",
            "show",
            "--json",
            "--dir",
            dir.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("inputSchema"));
}

#[test]
fn profiles_show_missing_fails() {
    let dir = seeded_profiles();
    dtg()
        .args(["profiles", "show", "ghost", "--dir", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("ghost"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("gateway.toml");
    std::fs::write(&cfg, "[server]\nhttp_port = 0\n").unwrap();
    dtg()
        .args(["--config", cfg.to_str().unwrap(), "profiles", "list"])
        .assert()
        .failure();
}
