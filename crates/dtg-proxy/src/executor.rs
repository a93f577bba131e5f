// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tool executor that forwards every call to the gateway over HTTP.

use crate::target::RelayTarget;
use async_trait::async_trait;
use dtg_core::{ToolCallRequest, ToolCatalog, ToolClient, ToolExecutor, ToolOutcome};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Relay ceiling. Larger than the gateway's own 30s call ceiling so that
/// the gateway's 504 normally arrives before this fires.
pub const DEFAULT_PROXY_TIMEOUT: Duration = Duration::from_secs(35);

const TIMEOUT_MESSAGE: &str = "tool call timed out";
const NOT_CONNECTED_MESSAGE: &str = "device not connected";

/// Executes device tools through the gateway's tool-call route.
///
/// Tool listing comes from a local catalog mirror, never the network. Each
/// call opens its own HTTP client, so concurrent calls share no state.
pub struct ProxyExecutor {
    target: RelayTarget,
    mirror: Arc<dyn ToolClient>,
    timeout: Duration,
}

impl ProxyExecutor {
    /// Relay to `target`, answering listing queries from `mirror`.
    pub fn new(target: RelayTarget, mirror: Arc<dyn ToolClient>) -> Self {
        Self {
            target,
            mirror,
            timeout: DEFAULT_PROXY_TIMEOUT,
        }
    }

    /// Override the per-call ceiling.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Where calls are sent.
    pub fn target(&self) -> &RelayTarget {
        &self.target
    }

    /// Per-call ceiling.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn forward(&self, request: &ToolCallRequest) -> ToolOutcome {
        let client = match reqwest::Client::builder().timeout(self.timeout).build() {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(target: "dtg.proxy", error = %e, "failed to build http client");
                return ToolOutcome::error(e.to_string());
            }
        };

        let mut builder = client.post(self.target.call_url()).json(request);
        match self.target.credential().header() {
            Ok(Some((name, value))) => builder = builder.header(name, value),
            Ok(None) => {}
            Err(e) => {
                tracing::error!(target: "dtg.proxy", error = %e, "failed to mint relay credential");
                return ToolOutcome::error(e.to_string());
            }
        }

        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => return transport_failure(&request.tool_name, &e),
        };
        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice::<Value>(&bytes).unwrap_or(Value::Null),
            Err(e) => return transport_failure(&request.tool_name, &e),
        };

        let outcome = map_response(&request.tool_name, status, &body);
        tracing::debug!(
            target: "dtg.proxy",
            tool = %request.tool_name,
            status,
            outcome = outcome.label(),
            "relayed tool call"
        );
        outcome
    }
}

#[async_trait]
impl ToolExecutor for ProxyExecutor {
    fn has_tool(&self, name: &str) -> bool {
        self.mirror.has_tool(name)
    }

    fn get_tools(&self) -> ToolCatalog {
        self.mirror.tools()
    }

    async fn execute(&self, name: &str, arguments: Map<String, Value>) -> ToolOutcome {
        let request = ToolCallRequest::routed(name, arguments);
        self.forward(&request).await
    }
}

impl std::fmt::Debug for ProxyExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyExecutor")
            .field("target", &self.target)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn transport_failure(tool: &str, err: &reqwest::Error) -> ToolOutcome {
    if err.is_timeout() {
        tracing::warn!(target: "dtg.proxy", tool, "relayed tool call timed out");
        return ToolOutcome::error(TIMEOUT_MESSAGE);
    }
    let chain = error_chain(err);
    tracing::error!(target: "dtg.proxy", tool, error = %chain, "relay transport failure");
    ToolOutcome::error(format!("cannot connect to gateway: {chain}"))
}

/// `err` followed by every distinct cause in its source chain, `: `-joined.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if parts.last() != Some(&text) {
            parts.push(text);
        }
        source = cause.source();
    }
    parts.join(": ")
}

/// Translate a gateway reply into a local outcome.
pub fn map_response(tool: &str, status: u16, body: &Value) -> ToolOutcome {
    let error_text = body.get("error").and_then(Value::as_str);
    match status {
        200 if body.get("success").and_then(Value::as_bool) == Some(true) => {
            ToolOutcome::success(stringify_result(body.get("result").unwrap_or(&Value::Null)))
        }
        503 => ToolOutcome::error(error_text.unwrap_or(NOT_CONNECTED_MESSAGE)),
        504 => ToolOutcome::error(TIMEOUT_MESSAGE),
        404 => ToolOutcome::not_found(
            error_text
                .map(str::to_string)
                .unwrap_or_else(|| format!("tool {tool} does not exist")),
        ),
        other => ToolOutcome::error(
            error_text
                .map(str::to_string)
                .unwrap_or_else(|| format!("proxy call failed: HTTP {other}")),
        ),
    }
}

/// Strings pass through unquoted, null becomes empty, everything else is
/// compact JSON.
pub fn stringify_result(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_requires_flag() {
        let ok = map_response("t", 200, &json!({"success": true, "result": "done"}));
        assert_eq!(ok, ToolOutcome::success("done"));

        let flagged_false = map_response("t", 200, &json!({"success": false, "error": "nope"}));
        assert_eq!(flagged_false, ToolOutcome::error("nope"));
    }

    #[test]
    fn structured_result_is_compact_json() {
        let ok = map_response("t", 200, &json!({"success": true, "result": {"on": true}}));
        assert_eq!(ok, ToolOutcome::success(r#"{"on":true}"#));
        let empty = map_response("t", 200, &json!({"success": true}));
        assert_eq!(empty, ToolOutcome::success(""));
    }

    #[test]
    fn unavailable_uses_payload_or_fallback() {
        assert_eq!(
            map_response("t", 503, &json!({"success": false, "error": "no device"})),
            ToolOutcome::error("no device")
        );
        assert_eq!(
            map_response("t", 503, &Value::Null),
            ToolOutcome::error("device not connected")
        );
    }

    #[test]
    fn gateway_timeout_message_is_fixed() {
        assert_eq!(
            map_response("t", 504, &json!({"error": "whatever"})),
            ToolOutcome::error("tool call timed out")
        );
    }

    #[derive(Debug)]
    struct Layered(&'static str, Option<Box<Layered>>);

    impl std::fmt::Display for Layered {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for Layered {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            self.1.as_deref().map(|e| e as _)
        }
    }

    #[test]
    fn error_chain_joins_distinct_causes() {
        let err = Layered(
            "error sending request",
            Some(Box::new(Layered(
                "client error (Connect)",
                Some(Box::new(Layered(
                    "client error (Connect)",
                    Some(Box::new(Layered("Connection refused (os error 111)", None))),
                ))),
            ))),
        );
        assert_eq!(
            error_chain(&err),
            "error sending request: client error (Connect): Connection refused (os error 111)"
        );
        assert_eq!(error_chain(&Layered("alone", None)), "alone");
    }

    #[test]
    fn not_found_and_other_statuses() {
        assert_eq!(
            map_response("lamp", 404, &Value::Null),
            ToolOutcome::not_found("tool lamp does not exist")
        );
        assert_eq!(
            map_response("t", 401, &json!({"error": "authentication failed"})),
            ToolOutcome::error("authentication failed")
        );
        assert_eq!(
            map_response("t", 502, &Value::Null),
            ToolOutcome::error("proxy call failed: HTTP 502")
        );
    }
}
