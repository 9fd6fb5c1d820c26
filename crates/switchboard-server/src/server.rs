use crate::mcp::{self, JsonRpcRequest};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use switchboard_core::ToolRegistry;

/// Shared application state.
pub struct AppState {
    /// The tool registry built at startup.
    pub registry: Arc<ToolRegistry>,
}

/// Builds the HTTP router serving the MCP endpoint and a health probe.
pub fn build_router(registry: Arc<ToolRegistry>) -> Router {
    let state = Arc::new(AppState { registry });
    Router::new()
        .route("/mcp", post(mcp_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": "switchboard"}))
}

async fn mcp_handler(State(state): State<Arc<AppState>>, body: String) -> Response {
    let request: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(_) => return Json(mcp::parse_error_response()).into_response(),
    };
    match mcp::handle_request(&state.registry, request).await {
        Some(response) => Json(response).into_response(),
        // Notifications get no response body.
        None => StatusCode::ACCEPTED.into_response(),
    }
}
