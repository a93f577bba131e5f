// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error taxonomy with stable codes for the device tool gateway.
//!
//! Every failure the tool-call endpoint can report carries an [`ErrorCode`]
//! (a machine-readable, stable string tag) that maps to exactly one HTTP
//! status. Handlers build a [`GatewayError`] where the failure happens and
//! the HTTP edge converts it once.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The auth gate denied the request.
    AuthFailed,
    /// Body is not a JSON object or lacks `tool_name`.
    MalformedRequest,
    /// No connection matches the request.
    NoConnection,
    /// The matched connection has no tool client.
    ClientNotAttached,
    /// The tool client has not finished its handshake.
    ClientNotReady,
    /// The device does not advertise the requested tool.
    ToolNotFound,
    /// The device did not answer within the call ceiling.
    ToolTimeout,
    /// The device rejected the arguments.
    ToolValidation,
    /// Any other failure.
    Internal,
}

impl ErrorCode {
    /// HTTP status reported for this code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::AuthFailed => 401,
            Self::MalformedRequest | Self::ToolValidation => 400,
            Self::NoConnection | Self::ClientNotAttached | Self::ClientNotReady => 503,
            Self::ToolNotFound => 404,
            Self::ToolTimeout => 504,
            Self::Internal => 500,
        }
    }

    /// Whether this code describes an expected, pre-invocation condition
    /// that should not be logged as an error.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::AuthFailed
                | Self::MalformedRequest
                | Self::NoConnection
                | Self::ClientNotAttached
                | Self::ClientNotReady
                | Self::ToolNotFound
        )
    }

    /// Stable `&'static str` representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthFailed => "AUTH_FAILED",
            Self::MalformedRequest => "MALFORMED_REQUEST",
            Self::NoConnection => "NO_CONNECTION",
            Self::ClientNotAttached => "CLIENT_NOT_ATTACHED",
            Self::ClientNotReady => "CLIENT_NOT_READY",
            Self::ToolNotFound => "TOOL_NOT_FOUND",
            Self::ToolTimeout => "TOOL_TIMEOUT",
            Self::ToolValidation => "TOOL_VALIDATION",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GatewayError
// ---------------------------------------------------------------------------

/// A classified gateway failure.
///
/// `message` is what the caller sees. Internal detail goes into `context`,
/// which is only ever logged.
///
/// ```
/// use dtg_error::{ErrorCode, GatewayError};
///
/// let err = GatewayError::tool_not_found("self.light.on")
///     .with_context("device_id", "aa:bb");
/// assert_eq!(err.code.http_status(), 404);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Caller-facing description.
    pub message: String,
    /// Structured diagnostic context, never sent to callers.
    pub context: BTreeMap<String, serde_json::Value>,
}

impl GatewayError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// Values that fail to serialise are skipped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// 401 for a denied caller.
    pub fn auth_failed() -> Self {
        Self::new(ErrorCode::AuthFailed, "authentication failed")
    }

    /// 400 for an unusable body.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedRequest, message)
    }

    /// 503 when no connection matches.
    pub fn no_connection() -> Self {
        Self::new(ErrorCode::NoConnection, "no device connection available")
    }

    /// 503 when the connection has no tool client.
    pub fn client_not_attached() -> Self {
        Self::new(
            ErrorCode::ClientNotAttached,
            "device tool client not initialized",
        )
    }

    /// 503 when the tool client is not ready.
    pub fn client_not_ready() -> Self {
        Self::new(ErrorCode::ClientNotReady, "device tool client not ready")
    }

    /// 404 for an unadvertised tool.
    pub fn tool_not_found(tool: &str) -> Self {
        Self::new(
            ErrorCode::ToolNotFound,
            format!("device does not support tool: {tool}"),
        )
    }

    /// 504 when the call ceiling elapses.
    pub fn tool_timeout() -> Self {
        Self::new(ErrorCode::ToolTimeout, "tool call timed out")
    }

    /// 400 carrying the device's validation text verbatim.
    pub fn tool_validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ToolValidation, message)
    }

    /// 500 with a generic message; `detail` is kept for logs only.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, "tool call failed").with_context("detail", detail.into())
    }

    /// Shorthand for `self.code.http_status()`.
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// The `{success: false, error}` body sent to callers.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({ "success": false, "error": self.message })
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if !self.context.is_empty() {
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for GatewayError {}
