// SPDX-License-Identifier: MIT OR Apache-2.0
//! Device connections and the registry used to look them up.

use crate::ToolClient;
use std::fmt;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// One live device session as seen by the gateway.
///
/// Both the identifier and the tool client are optional: a device may not
/// have announced itself yet, and its tool handshake may not have started.
#[derive(Clone, Default)]
pub struct DeviceConnection {
    /// Identifier the device reported for itself.
    pub device_id: Option<String>,
    /// Identifier taken from the `device-id` handshake header.
    pub header_device_id: Option<String>,
    /// Attached tool client, if the handshake has begun.
    pub tool_client: Option<Arc<dyn ToolClient>>,
}

impl DeviceConnection {
    /// A connection with neither identifier nor tool client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the self-reported device identifier.
    #[must_use]
    pub fn with_device_id(mut self, id: impl Into<String>) -> Self {
        self.device_id = Some(id.into());
        self
    }

    /// Set the handshake-header identifier.
    #[must_use]
    pub fn with_header_device_id(mut self, id: impl Into<String>) -> Self {
        self.header_device_id = Some(id.into());
        self
    }

    /// Attach a tool client.
    #[must_use]
    pub fn with_tool_client(mut self, client: Arc<dyn ToolClient>) -> Self {
        self.tool_client = Some(client);
        self
    }

    /// The reported identifier, falling back to the header-derived one.
    pub fn effective_device_id(&self) -> Option<&str> {
        self.device_id
            .as_deref()
            .or(self.header_device_id.as_deref())
    }
}

impl fmt::Debug for DeviceConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConnection")
            .field("device_id", &self.device_id)
            .field("header_device_id", &self.header_device_id)
            .field("has_tool_client", &self.tool_client.is_some())
            .finish()
    }
}

/// Lookup capability over the live connections held by this process.
///
/// Iteration order is implementation-defined and not guaranteed stable.
pub trait ConnectionRegistry: Send + Sync {
    /// Snapshot of all current connections.
    fn connections(&self) -> Vec<Arc<DeviceConnection>>;

    /// First connection matching `predicate`.
    fn find(&self, predicate: &dyn Fn(&DeviceConnection) -> bool) -> Option<Arc<DeviceConnection>> {
        self.connections().into_iter().find(|c| predicate(c))
    }
}

/// Registry backed by an in-process list, used by transports that keep
/// their sessions in memory and by tests.
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    entries: RwLock<Vec<(Uuid, Arc<DeviceConnection>)>>,
}

impl InMemoryConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection, returning a handle for later removal.
    pub fn insert(&self, connection: DeviceConnection) -> Uuid {
        let handle = Uuid::new_v4();
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((handle, Arc::new(connection)));
        handle
    }

    /// Remove a connection by handle.
    pub fn remove(&self, handle: Uuid) -> Option<Arc<DeviceConnection>> {
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let idx = guard.iter().position(|(h, _)| *h == handle)?;
        Some(guard.remove(idx).1)
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConnectionRegistry for InMemoryConnectionRegistry {
    fn connections(&self) -> Vec<Arc<DeviceConnection>> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, c)| Arc::clone(c))
            .collect()
    }
}
