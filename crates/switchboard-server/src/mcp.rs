use serde::{Deserialize, Serialize};
use switchboard_core::{ToolOutcome, ToolRegistry};
use tracing::debug;

/// Protocol revision advertised by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// JSON-RPC 2.0 request as received from a client.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Request id; absent for notifications.
    pub id: Option<serde_json::Value>,
    /// Method name, e.g. `tools/call`.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// Always `"2.0"`.
    pub jsonrpc: &'static str,
    /// Echo of the request id.
    pub id: serde_json::Value,
    /// Result payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error object on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// Standard JSON-RPC error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
}

impl JsonRpcResponse {
    fn result(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: serde_json::Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Response for a body that did not parse as JSON-RPC at all.
pub fn parse_error_response() -> JsonRpcResponse {
    JsonRpcResponse::error(serde_json::Value::Null, PARSE_ERROR, "Parse error")
}

/// Handles one request against the registry.
///
/// Returns `None` for notifications (no id), which get no response body.
pub async fn handle_request(
    registry: &ToolRegistry,
    request: JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    let id = request.id?;
    debug!(method = %request.method, "Handling JSON-RPC request");

    let response = match request.method.as_str() {
        "initialize" => JsonRpcResponse::result(
            id,
            serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {}},
                "serverInfo": {
                    "name": "switchboard",
                    "version": env!("CARGO_PKG_VERSION"),
                }
            }),
        ),
        "ping" => JsonRpcResponse::result(id, serde_json::json!({})),
        "tools/list" => {
            let tools: Vec<_> = registry
                .descriptors()
                .into_iter()
                .map(|d| {
                    serde_json::json!({
                        "name": d.name,
                        "description": d.description,
                        "inputSchema": d.parameters_schema,
                    })
                })
                .collect();
            JsonRpcResponse::result(id, serde_json::json!({ "tools": tools }))
        }
        "tools/call" => {
            let Some(name) = request.params.get("name").and_then(|n| n.as_str()) else {
                return Some(JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    "tools/call requires a 'name' parameter",
                ));
            };
            let arguments = request
                .params
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| serde_json::json!({}));
            let outcome = registry.dispatch(name, arguments).await;
            JsonRpcResponse::result(id, wrap_outcome(outcome))
        }
        other => JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Unknown method: {other}")),
    };
    Some(response)
}

/// Wraps the gateway's envelope into MCP content items.
///
/// This is the only place transport-specific result shaping happens.
fn wrap_outcome(outcome: ToolOutcome) -> serde_json::Value {
    match outcome {
        ToolOutcome::Success { data } => serde_json::json!({
            "content": [{"type": "text", "text": data.to_string()}],
            "isError": false,
        }),
        ToolOutcome::Failure { kind, message } => serde_json::json!({
            "content": [{"type": "text", "text": message}],
            "isError": true,
            "_meta": {"kind": kind},
        }),
    }
}
