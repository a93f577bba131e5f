// SPDX-License-Identifier: MIT OR Apache-2.0
//! End to end: a detached tool manager restores a saved profile and relays
//! calls through a live gateway to a connected device.

use async_trait::async_trait;
use dtg_auth::AuthGate;
use dtg_config::GatewayConfig;
use dtg_core::{
    DeviceConnection, InMemoryConnectionRegistry, ToolCatalog, ToolClient, ToolDescriptor,
    ToolInvokeError, ToolOutcome,
};
use dtg_daemon::{AppState, build_app};
use dtg_profile::{ProfileStore, save_reported_catalog};
use dtg_proxy::restore_device_tools;
use dtg_runtime::ToolManager;
use serde_json::{Map, Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

struct Lamp {
    catalog: ToolCatalog,
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl ToolClient for Lamp {
    async fn is_ready(&self) -> bool {
        true
    }

    fn has_tool(&self, name: &str) -> bool {
        self.catalog.contains(name)
    }

    fn tools(&self) -> ToolCatalog {
        self.catalog.clone()
    }

    async fn execute(&self, name: &str, arguments: &str) -> Result<Value, ToolInvokeError> {
        self.seen.lock().unwrap().push(arguments.to_string());
        let args: Value = serde_json::from_str(arguments)
            .map_err(|e| ToolInvokeError::Validation(e.to_string()))?;
        match args.get("level").and_then(Value::as_i64) {
            Some(level) if level > 100 => {
                Err(ToolInvokeError::Validation("level must be 0-100".into()))
            }
            Some(level) => Ok(json!({"tool": name, "level": level})),
            None => Ok(json!("ok")),
        }
    }
}

fn lamp_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new("self.lamp.set", json!({"type": "object"})),
        ToolDescriptor::new("self.lamp.blink", json!({"type": "object"})),
    ]
}

async fn spawn_gateway(lamp: Arc<Lamp>) -> SocketAddr {
    let registry = Arc::new(InMemoryConnectionRegistry::new());
    registry.insert(
        DeviceConnection::new()
            .with_device_id("lamp-1")
            .with_tool_client(lamp),
    );
    let app = build_app(Arc::new(AppState::new(registry, AuthGate::new())));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });
    addr
}

fn detached_config(addr: SocketAddr, profiles: &std::path::Path) -> GatewayConfig {
    let mut cfg = GatewayConfig::default();
    cfg.server.ip = "0.0.0.0".into();
    cfg.server.http_port = addr.port();
    cfg.tools.profiles_dir = profiles.display().to_string();
    cfg
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn restored_tools_relay_to_live_device() {
    // The device advertises only one of the two tools it once reported.
    let lamp = Arc::new(Lamp {
        catalog: vec![ToolDescriptor::new("self.lamp.set", json!({"type": "object"}))].into(),
        seen: Mutex::new(Vec::new()),
    });
    let addr = spawn_gateway(lamp.clone()).await;

    let profiles = tempfile::tempdir().unwrap();
    let reported: ToolCatalog = lamp_tools().into();
    let saved = save_reported_catalog(&ProfileStore::new(profiles.path()), &reported).unwrap();
    assert!(saved.created);

    let manager = ToolManager::new();
    let report =
        restore_device_tools(&detached_config(addr, profiles.path()), &manager, None).unwrap();
    assert_eq!(report.profile, saved.name);
    assert_eq!(report.tools, 2);
    assert_eq!(report.relay_url, format!("http://127.0.0.1:{}", addr.port()));
    assert!(manager.has_tool("self.lamp.set"));
    assert!(manager.has_tool("self.lamp.blink"));

    let ok = manager
        .execute_tool(
            "self.lamp.set",
            args(json!({"level": 40, "device_id": "lamp-1"})),
        )
        .await;
    assert!(ok.is_success(), "{ok:?}");
    let payload: Value = serde_json::from_str(ok.text()).unwrap();
    assert_eq!(payload, json!({"tool": "self.lamp.set", "level": 40}));
    assert_eq!(
        lamp.seen.lock().unwrap().clone(),
        vec![r#"{"level":40}"#.to_string()]
    );

    let invalid = manager
        .execute_tool("self.lamp.set", args(json!({"level": 400})))
        .await;
    assert_eq!(invalid, ToolOutcome::error("level must be 0-100"));

    let gone = manager
        .execute_tool("self.lamp.blink", Map::new())
        .await;
    assert_eq!(
        gone,
        ToolOutcome::not_found("device does not support tool: self.lamp.blink")
    );

    let wrong_device = manager
        .execute_tool("self.lamp.set", args(json!({"device_id": "lamp-9"})))
        .await;
    assert_eq!(wrong_device, ToolOutcome::error("no device connection available"));
}

#[tokio::test]
async fn restore_without_profiles_registers_nothing() {
    let profiles = tempfile::tempdir().unwrap();
    let manager = ToolManager::new();
    let cfg = detached_config("127.0.0.1:9".parse().unwrap(), profiles.path());
    assert!(restore_device_tools(&cfg, &manager, None).is_none());
    assert!(manager.list_tools().is_empty());
}

#[tokio::test]
async fn gateway_down_is_a_recoverable_outcome() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let profiles = tempfile::tempdir().unwrap();
    save_reported_catalog(&ProfileStore::new(profiles.path()), &lamp_tools().into()).unwrap();

    let manager = ToolManager::new();
    restore_device_tools(&detached_config(addr, profiles.path()), &manager, None).unwrap();
    let outcome = manager.execute_tool("self.lamp.set", Map::new()).await;
    assert!(!outcome.is_success());
    assert!(outcome.text().starts_with("cannot connect to gateway"));
}

#[tokio::test]
async fn concurrent_relayed_calls_all_complete() {
    let lamp = Arc::new(Lamp {
        catalog: lamp_tools().into(),
        seen: Mutex::new(Vec::new()),
    });
    let addr = spawn_gateway(lamp.clone()).await;
    let profiles = tempfile::tempdir().unwrap();
    save_reported_catalog(&ProfileStore::new(profiles.path()), &lamp_tools().into()).unwrap();

    let manager = Arc::new(ToolManager::new());
    restore_device_tools(&detached_config(addr, profiles.path()), &manager, None).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|level| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                manager
                    .execute_tool("self.lamp.set", args(json!({"level": level})))
                    .await
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_success());
    }
    assert_eq!(lamp.seen.lock().unwrap().len(), 8);
}
