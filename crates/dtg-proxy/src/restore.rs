// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bring previously seen device tools back in a process with no devices.

use crate::executor::ProxyExecutor;
use crate::target::RelayTarget;
use dtg_auth::TokenError;
use dtg_config::GatewayConfig;
use dtg_core::ToolClient;
use dtg_profile::ProfileStore;
use dtg_runtime::{CatalogToolClient, DEVICE_TOOLS, ToolManager};
use std::sync::Arc;
use std::time::Duration;

/// What a successful restore installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    /// Profile the tools came from.
    pub profile: String,
    /// Number of restored tools.
    pub tools: usize,
    /// Gateway base URL calls are relayed to.
    pub relay_url: String,
}

#[derive(Debug, thiserror::Error)]
enum RestoreError {
    #[error("cannot build relay credential: {0}")]
    Credential(#[from] TokenError),
}

/// Load a persisted profile and install a [`ProxyExecutor`] for it.
///
/// `profile` overrides `tools.profile` from the config; with neither, the
/// lexicographically first profile is used. Returns `None` when nothing was
/// restored. Failures are logged and never propagate: the caller keeps
/// starting up without device tools.
pub fn restore_device_tools(
    config: &GatewayConfig,
    manager: &ToolManager,
    profile: Option<&str>,
) -> Option<RestoreReport> {
    let store = ProfileStore::new(&config.tools.profiles_dir);
    match try_restore(config, &store, manager, profile) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(target: "dtg.restore", error = %e, "failed to restore device tools");
            None
        }
    }
}

fn try_restore(
    config: &GatewayConfig,
    store: &ProfileStore,
    manager: &ToolManager,
    profile: Option<&str>,
) -> Result<Option<RestoreReport>, RestoreError> {
    let requested = profile.or(config.tools.profile());
    let loaded = store.load(requested);
    let Some(name) = loaded.name.filter(|_| !loaded.catalog.is_empty()) else {
        tracing::info!(
            target: "dtg.restore",
            dir = %store.dir().display(),
            requested = requested.unwrap_or("<first>"),
            "no persisted device tools to restore"
        );
        return Ok(None);
    };

    let mirror = Arc::new(CatalogToolClient::new());
    for tool in loaded.catalog {
        mirror.add_tool(tool);
    }
    mirror.set_ready(true);
    let tools = mirror.tools().len();

    let target = RelayTarget::from_config(config)?;
    let relay_url = target.base_url().to_string();
    let credential = target.credential().kind();
    let executor = ProxyExecutor::new(target, mirror)
        .with_timeout(Duration::from_secs(config.tools.proxy_timeout_secs));

    manager.register_executor(DEVICE_TOOLS, Arc::new(executor));
    manager.refresh_tools();

    tracing::info!(
        target: "dtg.restore",
        profile = %name,
        tools,
        relay = %relay_url,
        credential,
        "restored device tools"
    );
    Ok(Some(RestoreReport {
        profile: name,
        tools,
        relay_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtg_core::{ToolCatalog, ToolDescriptor};
    use dtg_profile::SaveMode;
    use serde_json::json;

    fn config_for(dir: &std::path::Path) -> GatewayConfig {
        let mut cfg = GatewayConfig::default();
        cfg.tools.profiles_dir = dir.display().to_string();
        cfg
    }

    #[test]
    fn nothing_to_restore_leaves_manager_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = ToolManager::new();
        assert_eq!(restore_device_tools(&config_for(dir.path()), &mgr, None), None);
        assert!(mgr.capabilities().is_empty());
    }

    #[test]
    fn explicit_profile_beats_config_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        let one: ToolCatalog = vec![ToolDescriptor::new("one", json!({}))].into();
        let two: ToolCatalog = vec![ToolDescriptor::new("two", json!({}))].into();
        store.save(&one, SaveMode::Named("a")).unwrap();
        store.save(&two, SaveMode::Named("b")).unwrap();

        let mut cfg = config_for(dir.path());
        cfg.tools.profile = Some("a".into());

        let mgr = ToolManager::new();
        let report = restore_device_tools(&cfg, &mgr, Some("b")).unwrap();
        assert_eq!(report.profile, "b");
        assert!(mgr.has_tool("two"));
        assert!(!mgr.has_tool("one"));
    }

    #[test]
    fn missing_named_profile_restores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = ToolManager::new();
        assert!(restore_device_tools(&config_for(dir.path()), &mgr, Some("ghost")).is_none());
    }
}
