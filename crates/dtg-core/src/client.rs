// SPDX-License-Identifier: MIT OR Apache-2.0
//! The live tool client attached to a device connection.

use crate::ToolCatalog;
use async_trait::async_trait;
use serde_json::Value;

/// Why a device-side tool invocation failed.
///
/// This is the error-kind boundary between the device transport and the
/// gateway; the endpoint maps each variant to a response status once.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolInvokeError {
    /// The device rejected the arguments. The text is shown to callers as is.
    #[error("{0}")]
    Validation(String),
    /// The device did not answer in time.
    #[error("tool call timed out")]
    Timeout,
    /// Any other failure; the detail is for server-side logs only.
    #[error("tool call failed: {0}")]
    Failed(String),
}

/// Per-connection object able to list and invoke a device's tools.
///
/// Per-device serialization of concurrent calls, if any, is the
/// implementor's responsibility.
#[async_trait]
pub trait ToolClient: Send + Sync {
    /// Whether the client has finished its tool handshake.
    async fn is_ready(&self) -> bool;

    /// Whether the device advertises a tool with this name.
    fn has_tool(&self, name: &str) -> bool;

    /// Snapshot of the advertised tools.
    fn tools(&self) -> ToolCatalog;

    /// Invoke `name` with JSON-serialized `arguments`, returning the raw
    /// result payload.
    async fn execute(&self, name: &str, arguments: &str) -> Result<Value, ToolInvokeError>;
}
