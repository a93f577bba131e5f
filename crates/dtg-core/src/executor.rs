// SPDX-License-Identifier: MIT OR Apache-2.0
//! The tool-invocation capability surface.

use crate::ToolCatalog;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of one tool invocation through a [`ToolExecutor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolOutcome {
    /// The tool ran; `result` is the stringified payload.
    Success {
        /// Stringified tool result.
        result: String,
    },
    /// The call failed in a way the caller may retry or report.
    Error {
        /// Human-readable failure description.
        message: String,
    },
    /// No executor knows the requested tool.
    NotFound {
        /// Human-readable description.
        message: String,
    },
}

impl ToolOutcome {
    /// Successful outcome.
    pub fn success(result: impl Into<String>) -> Self {
        Self::Success {
            result: result.into(),
        }
    }

    /// Recoverable error outcome.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Not-found outcome.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Whether the tool ran successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The result on success or the message otherwise.
    pub fn text(&self) -> &str {
        match self {
            Self::Success { result } => result,
            Self::Error { message } | Self::NotFound { message } => message,
        }
    }

    /// Short label for the outcome kind.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
            Self::NotFound { .. } => "not_found",
        }
    }
}

/// Something that can answer for and invoke a set of tools.
///
/// Implementations never fail past this boundary: every failure mode is
/// folded into a [`ToolOutcome`].
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Whether this executor handles `name`.
    fn has_tool(&self, name: &str) -> bool;

    /// The tools this executor currently exposes.
    fn get_tools(&self) -> ToolCatalog;

    /// Invoke `name` with `arguments`.
    async fn execute(&self, name: &str, arguments: Map<String, Value>) -> ToolOutcome;
}
