// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed map from capability name to the executor that serves it.

use dtg_core::ToolExecutor;
use std::collections::HashMap;
use std::sync::Arc;

/// Capability under which device tools are registered.
pub const DEVICE_TOOLS: &str = "device";

/// At most one [`ToolExecutor`] per capability.
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn ToolExecutor>>,
}

impl ExecutorRegistry {
    /// Register `executor` for `capability`, returning the one it replaced.
    pub fn register(
        &mut self,
        capability: impl Into<String>,
        executor: Arc<dyn ToolExecutor>,
    ) -> Option<Arc<dyn ToolExecutor>> {
        self.executors.insert(capability.into(), executor)
    }

    /// Return an `Arc` handle to the executor for `capability`.
    pub fn get_arc(&self, capability: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.executors.get(capability).cloned()
    }

    /// Sorted capability names.
    pub fn list(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.executors.keys().map(|s| s.as_str()).collect();
        v.sort();
        v
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("capabilities", &self.list())
            .finish()
    }
}
