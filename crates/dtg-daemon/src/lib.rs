// SPDX-License-Identifier: MIT OR Apache-2.0
//! HTTP surface of the device gateway.
//!
//! Detached tool servers reach the live device sessions held by this
//! process through two internal routes:
//!
//! - `POST /internal/tool/call` invokes one tool on one device.
//! - `GET /internal/devices` lists the connected devices and their tools.
//!
//! Both sit behind the same [`AuthGate`]. Every failure is rendered once, at
//! the edge, as `{success: false, error}` with the status of its
//! [`ErrorCode`].
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Request id, request logging and CORS layers.
pub mod middleware;

use axum::{
    Json, Router,
    body::{Bytes, to_bytes},
    extract::{ConnectInfo, Request, State},
    http::{StatusCode, request::Parts},
    middleware as axum_mw,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use dtg_auth::AuthGate;
use dtg_core::{
    ConnectionRegistry, DEVICE_ID_ARGUMENT, DeviceConnection, DeviceSummary, ToolClient,
    ToolInvokeError,
};
use dtg_error::{ErrorCode, GatewayError};
use middleware::{CorsConfig, RequestLogger, request_id_middleware};
use serde_json::{Map, Value, json};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

/// Route that executes a tool on a connected device.
pub const TOOL_CALL_ROUTE: &str = "/internal/tool/call";

/// Route that lists connected devices.
pub const DEVICES_ROUTE: &str = "/internal/devices";

/// Ceiling on a single device invocation.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared state behind every route.
pub struct AppState {
    /// Live device connections.
    pub registry: Arc<dyn ConnectionRegistry>,
    /// Caller admission policy.
    pub gate: AuthGate,
    /// Ceiling on a single device invocation.
    pub call_timeout: Duration,
}

impl AppState {
    /// State with the default call ceiling.
    pub fn new(registry: Arc<dyn ConnectionRegistry>, gate: AuthGate) -> Self {
        Self {
            registry,
            gate,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Override the call ceiling.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

/// A [`GatewayError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if err.code.is_expected() {
            tracing::debug!(target: "dtg.daemon", code = err.code.as_str(), error = %err, "request rejected");
        } else if err.code == ErrorCode::Internal {
            tracing::error!(target: "dtg.daemon", code = err.code.as_str(), error = %err, "tool call failed");
        } else {
            tracing::warn!(target: "dtg.daemon", code = err.code.as_str(), error = %err, "tool call failed");
        }
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(err.to_body())).into_response()
    }
}

/// Map a device-side invocation failure onto the gateway taxonomy.
pub fn invoke_error(err: ToolInvokeError) -> GatewayError {
    match err {
        ToolInvokeError::Validation(message) => GatewayError::tool_validation(message),
        ToolInvokeError::Timeout => GatewayError::tool_timeout(),
        ToolInvokeError::Failed(detail) => GatewayError::internal(detail),
    }
}

/// Build the gateway router.
///
/// The peer address used by the network rule comes from
/// [`ConnectInfo<SocketAddr>`]; serve with
/// `into_make_service_with_connect_info::<SocketAddr>()` to populate it.
pub fn build_app(state: Arc<AppState>) -> Router {
    let call = Router::new()
        .route(TOOL_CALL_ROUTE, post(cmd_tool_call).options(cmd_preflight))
        .layer(CorsConfig::default().to_cors_layer());

    Router::new()
        .route("/health", get(cmd_health))
        .route(DEVICES_ROUTE, get(cmd_devices))
        .merge(call)
        .layer(axum_mw::from_fn(RequestLogger::layer))
        .layer(axum_mw::from_fn(request_id_middleware))
        .with_state(state)
}

async fn cmd_health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "time": Utc::now().to_rfc3339(),
    }))
}

async fn cmd_preflight() -> StatusCode {
    StatusCode::OK
}

async fn cmd_tool_call(
    State(state): State<Arc<AppState>>,
    req: Request,
) -> Result<Json<Value>, ApiError> {
    let (parts, body) = req.into_parts();
    authorize(&state, &parts)?;

    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| GatewayError::malformed("request body could not be read"))?;
    let call = parse_call(&bytes)?;

    let client = resolve_client(state.registry.as_ref(), call.device_id.as_deref()).await?;
    if !client.has_tool(&call.tool_name) {
        return Err(GatewayError::tool_not_found(&call.tool_name).into());
    }

    let arguments = Value::Object(call.arguments).to_string();
    tracing::debug!(
        target: "dtg.daemon",
        tool = %call.tool_name,
        device_id = call.device_id.as_deref().unwrap_or("<any>"),
        "invoking device tool"
    );

    let result = match tokio::time::timeout(
        state.call_timeout,
        client.execute(&call.tool_name, &arguments),
    )
    .await
    {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            return Err(invoke_error(err)
                .with_context("tool", &call.tool_name)
                .into());
        }
        Err(_) => {
            return Err(GatewayError::tool_timeout()
                .with_context("tool", &call.tool_name)
                .into());
        }
    };

    Ok(Json(json!({ "success": true, "result": result })))
}

async fn cmd_devices(
    State(state): State<Arc<AppState>>,
    req: Request,
) -> Result<Json<Value>, ApiError> {
    let (parts, _) = req.into_parts();
    authorize(&state, &parts)?;

    let mut devices = Vec::new();
    for conn in state.registry.connections() {
        let mut summary = DeviceSummary {
            device_id: conn.effective_device_id().map(str::to_string),
            has_mcp: conn.tool_client.is_some(),
            mcp_ready: false,
            tools: Vec::new(),
        };
        if let Some(client) = &conn.tool_client
            && client.is_ready().await
        {
            summary.mcp_ready = true;
            summary.tools = client.tools().names();
        }
        devices.push(summary);
    }

    Ok(Json(json!({ "success": true, "devices": devices })))
}

fn authorize(state: &AppState, parts: &Parts) -> Result<(), GatewayError> {
    let decision = state.gate.authorize(peer_ip(parts), &parts.headers);
    if decision.is_allowed() {
        tracing::trace!(target: "dtg.daemon", decision = ?decision, "caller admitted");
        Ok(())
    } else {
        Err(GatewayError::auth_failed())
    }
}

fn peer_ip(parts: &Parts) -> Option<IpAddr> {
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

#[derive(Debug)]
struct CallBody {
    tool_name: String,
    arguments: Map<String, Value>,
    device_id: Option<String>,
}

fn parse_call(bytes: &Bytes) -> Result<CallBody, GatewayError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|_| GatewayError::malformed("request body is not valid JSON"))?;
    let Value::Object(mut body) = value else {
        return Err(GatewayError::malformed("request body must be a JSON object"));
    };

    let tool_name = match body.remove("tool_name") {
        Some(Value::String(name)) if !name.is_empty() => name,
        _ => return Err(GatewayError::malformed("missing tool_name")),
    };
    let arguments = match body.remove("arguments") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(args)) => args,
        Some(_) => return Err(GatewayError::malformed("arguments must be a JSON object")),
    };
    let device_id = match body.remove(DEVICE_ID_ARGUMENT) {
        Some(Value::String(id)) if !id.is_empty() => Some(id),
        _ => None,
    };

    Ok(CallBody {
        tool_name,
        arguments,
        device_id,
    })
}

async fn resolve_client(
    registry: &dyn ConnectionRegistry,
    device_id: Option<&str>,
) -> Result<Arc<dyn ToolClient>, GatewayError> {
    if let Some(target) = device_id {
        // A stale session without a client may still carry the same id.
        let attached = registry
            .find(&|c: &DeviceConnection| {
                c.tool_client.is_some() && c.effective_device_id() == Some(target)
            })
            .and_then(|conn| conn.tool_client.clone());
        let Some(client) = attached else {
            let known = registry
                .find(&|c: &DeviceConnection| c.effective_device_id() == Some(target))
                .is_some();
            let err = if known {
                GatewayError::client_not_attached()
            } else {
                GatewayError::no_connection()
            };
            return Err(err.with_context("device_id", target));
        };
        if !client.is_ready().await {
            return Err(GatewayError::client_not_ready().with_context("device_id", target));
        }
        return Ok(client);
    }

    let mut saw_client = false;
    for conn in registry.connections() {
        let Some(client) = conn.tool_client.clone() else {
            continue;
        };
        saw_client = true;
        if client.is_ready().await {
            return Ok(client);
        }
    }
    if saw_client {
        Err(GatewayError::client_not_ready())
    } else {
        Err(GatewayError::no_connection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoke_errors_map_to_statuses() {
        assert_eq!(
            invoke_error(ToolInvokeError::Validation("bad".into())).http_status(),
            400
        );
        assert_eq!(invoke_error(ToolInvokeError::Timeout).http_status(), 504);
        let internal = invoke_error(ToolInvokeError::Failed("socket closed".into()));
        assert_eq!(internal.http_status(), 500);
        assert!(!internal.message.contains("socket closed"));
    }

    #[test]
    fn body_requires_tool_name() {
        assert!(parse_call(&Bytes::from_static(b"{}")).is_err());
        assert!(parse_call(&Bytes::from_static(br#"{"tool_name": ""}"#)).is_err());
        assert!(parse_call(&Bytes::from_static(b"[1]")).is_err());
        assert!(parse_call(&Bytes::from_static(b"not json")).is_err());
    }

    #[test]
    fn body_defaults_arguments_and_device() {
        let call = parse_call(&Bytes::from_static(
            br#"{"tool_name": "ping", "arguments": null, "device_id": ""}"#,
        ))
        .unwrap();
        assert_eq!(call.tool_name, "ping");
        assert!(call.arguments.is_empty());
        assert_eq!(call.device_id, None);
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let err = parse_call(&Bytes::from_static(
            br#"{"tool_name": "ping", "arguments": [1, 2]}"#,
        ))
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedRequest);
    }
}
