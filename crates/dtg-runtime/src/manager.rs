// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tool manager: executor registration plus a refreshed name index.

use crate::registry::ExecutorRegistry;
use dtg_core::{ToolCatalog, ToolExecutor, ToolOutcome};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

#[derive(Default)]
struct ToolIndex {
    /// Tool name to owning capability.
    owners: BTreeMap<String, String>,
    catalog: ToolCatalog,
}

/// Routes tool calls to the executor that owns each tool name.
///
/// The name index is only rebuilt by [`ToolManager::refresh_tools`]; a newly
/// registered executor's tools are invisible until the next refresh.
#[derive(Default)]
pub struct ToolManager {
    registry: RwLock<ExecutorRegistry>,
    index: RwLock<ToolIndex>,
}

impl ToolManager {
    /// A manager with no executors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `executor` as the sole handler for `capability`.
    ///
    /// Returns the executor it displaced, if any.
    pub fn register_executor(
        &self,
        capability: &str,
        executor: Arc<dyn ToolExecutor>,
    ) -> Option<Arc<dyn ToolExecutor>> {
        let previous = self
            .registry
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .register(capability, executor);
        if previous.is_some() {
            tracing::info!(target: "dtg.runtime", capability, "replaced tool executor");
        } else {
            tracing::debug!(target: "dtg.runtime", capability, "registered tool executor");
        }
        previous
    }

    /// The executor currently handling `capability`.
    pub fn executor(&self, capability: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.registry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get_arc(capability)
    }

    /// Sorted capability names with a registered executor.
    pub fn capabilities(&self) -> Vec<String> {
        self.registry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .list()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Rebuild the name index from every executor's current tools.
    ///
    /// Capabilities are visited in name order; when two claim the same
    /// tool the first keeps it. Returns the number of indexed tools.
    pub fn refresh_tools(&self) -> usize {
        let executors: Vec<(String, Arc<dyn ToolExecutor>)> = {
            let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
            registry
                .list()
                .into_iter()
                .filter_map(|cap| registry.get_arc(cap).map(|e| (cap.to_string(), e)))
                .collect()
        };

        let mut next = ToolIndex::default();
        for (capability, executor) in executors {
            for tool in executor.get_tools() {
                if let Some(owner) = next.owners.get(&tool.name) {
                    tracing::warn!(
                        target: "dtg.runtime",
                        tool = %tool.name,
                        kept = %owner,
                        skipped = %capability,
                        "tool claimed by two capabilities"
                    );
                    continue;
                }
                next.owners.insert(tool.name.clone(), capability.clone());
                next.catalog.insert(tool);
            }
        }

        let count = next.catalog.len();
        *self.index.write().unwrap_or_else(|e| e.into_inner()) = next;
        tracing::debug!(target: "dtg.runtime", tools = count, "refreshed tool index");
        count
    }

    /// Snapshot of every indexed tool.
    pub fn list_tools(&self) -> ToolCatalog {
        self.index
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .catalog
            .clone()
    }

    /// Whether `name` is indexed.
    pub fn has_tool(&self, name: &str) -> bool {
        self.index
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .owners
            .contains_key(name)
    }

    /// Invoke `name` through its owning executor.
    pub async fn execute_tool(&self, name: &str, arguments: Map<String, Value>) -> ToolOutcome {
        let owner = self
            .index
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .owners
            .get(name)
            .cloned();
        let Some(executor) = owner.and_then(|cap| self.executor(&cap)) else {
            return ToolOutcome::not_found(format!("tool not found: {name}"));
        };
        if !executor.has_tool(name) {
            return ToolOutcome::not_found(format!("tool not found: {name}"));
        }
        executor.execute(name, arguments).await
    }
}

impl std::fmt::Debug for ToolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolManager")
            .field("capabilities", &self.capabilities())
            .field("tools", &self.list_tools().len())
            .finish()
    }
}
