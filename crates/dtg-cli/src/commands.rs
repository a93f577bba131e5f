// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command implementations for the `dtg` CLI.
//!
//! These functions are library-level so they can be tested without
//! spawning the binary.

use anyhow::{Context, Result, bail};
use dtg_auth::TokenSigner;
use dtg_config::{GatewayConfig, load_config, validate_config};
use dtg_profile::{LoadedProfile, ProfileStore, ProfileSummary};
use std::path::Path;

/// Load configuration from `path` (or defaults) with environment overrides.
pub fn load(path: Option<&Path>) -> Result<GatewayConfig> {
    load_config(path).context("load config")
}

/// Reject invalid configuration and log warnings.
pub fn check_config(config: &GatewayConfig) -> Result<()> {
    for warning in validate_config(config).context("validate config")? {
        tracing::warn!(target: "dtg.cli", %warning, "config warning");
    }
    Ok(())
}

/// Issue a bearer token for `subject` valid for `expire_hours`.
pub fn issue_token(secret: &str, subject: &str, expire_hours: i64) -> Result<String> {
    if expire_hours <= 0 {
        bail!("--expire-hours must be positive, got {expire_hours}");
    }
    let signer = TokenSigner::new(secret).context("build token signer")?;
    signer
        .issue(subject, chrono::Duration::hours(expire_hours))
        .context("sign token")
}

/// Pick the signing key: an explicit key wins over the configured one.
pub fn resolve_signing_key(explicit: Option<String>, config: &GatewayConfig) -> Result<String> {
    if let Some(key) = explicit.filter(|k| !k.trim().is_empty()) {
        return Ok(key);
    }
    match config.server.auth_key() {
        Some(key) => Ok(key.to_string()),
        None => bail!("no signing key: pass --auth-key or set server.auth_key"),
    }
}

/// Every stored profile with its fingerprint and size.
pub fn list_profiles(dir: &Path) -> Vec<ProfileSummary> {
    ProfileStore::new(dir).summaries()
}

/// Load one profile (or the first one when `name` is `None`).
///
/// Fails when nothing resolves, unlike the store's best-effort load.
pub fn show_profile(dir: &Path, name: Option<&str>) -> Result<LoadedProfile> {
    let loaded = ProfileStore::new(dir).load(name);
    if loaded.name.is_none() {
        match name {
            Some(n) => bail!("profile '{n}' not found in {}", dir.display()),
            None => bail!("no profiles in {}", dir.display()),
        }
    }
    Ok(loaded)
}
