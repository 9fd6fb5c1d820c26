use crate::error::GatewayResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Metadata describing a tool's name, purpose, and input parameters.
///
/// `parameters_schema` is a JSON Schema object advertised to callers via
/// `tools/list`; the gateway itself only enforces the requirements each
/// handler checks explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Globally unique tool name.
    pub name: String,
    /// Human-readable description shown to callers.
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub parameters_schema: serde_json::Value,
}

/// Trait implemented by every provider operation exposed through the gateway.
///
/// `invoke` returns the raw success payload; all failures are expressed as
/// [`crate::GatewayError`] and normalized by the dispatcher. Implementations
/// must never let a vendor error type escape.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's descriptor.
    fn descriptor(&self) -> &ToolDescriptor;

    /// Executes the tool with the given JSON arguments.
    async fn invoke(&self, args: serde_json::Value) -> GatewayResult<serde_json::Value>;
}
