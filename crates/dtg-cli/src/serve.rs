// SPDX-License-Identifier: MIT OR Apache-2.0
//! Detached tool server: restored device tools behind a small HTTP API.

use crate::format::format_outcome;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use dtg_core::ToolDescriptor;
use dtg_runtime::ToolManager;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Body of `POST /tools/call`.
#[derive(Debug, Deserialize)]
pub struct CallToolRequest {
    /// Tool to invoke.
    pub name: String,
    /// Tool arguments; a `device_id` entry routes the call.
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// Router exposing `GET /tools` and `POST /tools/call` over `manager`.
pub fn build_tool_app(manager: Arc<ToolManager>) -> Router {
    Router::new()
        .route("/health", get(cmd_health))
        .route("/tools", get(cmd_list_tools))
        .route("/tools/call", post(cmd_call_tool))
        .with_state(manager)
}

async fn cmd_health(State(manager): State<Arc<ToolManager>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "tools": manager.list_tools().len(),
    }))
}

async fn cmd_list_tools(State(manager): State<Arc<ToolManager>>) -> Json<Vec<ToolDescriptor>> {
    Json(manager.list_tools().into_iter().collect())
}

async fn cmd_call_tool(
    State(manager): State<Arc<ToolManager>>,
    Json(req): Json<CallToolRequest>,
) -> Response {
    let outcome = manager.execute_tool(&req.name, req.arguments).await;
    tracing::info!(target: "dtg.cli", tool = %req.name, outcome = outcome.label(), "tool call");
    // Failed outcomes are still answers; the kind field tells them apart.
    let body = json!({
        "kind": outcome.label(),
        "text": format_outcome(&outcome),
    });
    (StatusCode::OK, Json(body)).into_response()
}
