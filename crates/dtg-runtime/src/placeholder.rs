// SPDX-License-Identifier: MIT OR Apache-2.0
//! A tool client that only knows a catalog.
//!
//! Restored profiles are held in one of these so that name lookups work
//! without a device. It cannot invoke anything itself; invocation goes
//! through whatever executor wraps it.

use async_trait::async_trait;
use dtg_core::{ToolCatalog, ToolClient, ToolDescriptor, ToolInvokeError};
use serde_json::Value;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory catalog with a readiness flag.
#[derive(Debug, Default)]
pub struct CatalogToolClient {
    tools: RwLock<ToolCatalog>,
    ready: AtomicBool,
}

impl CatalogToolClient {
    /// An empty, not-ready client.
    pub fn new() -> Self {
        Self::default()
    }

    /// A client pre-populated with `catalog`, still not ready.
    pub fn from_catalog(catalog: ToolCatalog) -> Self {
        Self {
            tools: RwLock::new(catalog),
            ready: AtomicBool::new(false),
        }
    }

    /// Add or replace one descriptor.
    pub fn add_tool(&self, tool: ToolDescriptor) {
        self.tools
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(tool);
    }

    /// Flip the readiness flag.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }
}

#[async_trait]
impl ToolClient for CatalogToolClient {
    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn has_tool(&self, name: &str) -> bool {
        self.tools
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(name)
    }

    fn tools(&self) -> ToolCatalog {
        self.tools
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn execute(&self, name: &str, _arguments: &str) -> Result<Value, ToolInvokeError> {
        Err(ToolInvokeError::Failed(format!(
            "catalog-only client cannot execute {name}"
        )))
    }
}
