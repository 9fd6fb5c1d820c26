use crate::error::GatewayError;
use serde::{Deserialize, Serialize};

/// The normalized envelope returned by every dispatched tool.
///
/// Handlers themselves return `GatewayResult<serde_json::Value>`; the
/// dispatcher converts the `Err` arm into [`ToolOutcome::Failure`] so the
/// transport layer only ever sees this one shape. Transport-specific
/// wrapping (e.g. MCP content items) happens at the transport boundary,
/// never here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    /// The operation succeeded with a provider-specific structured payload.
    Success {
        /// Structured result data.
        data: serde_json::Value,
    },
    /// The operation failed; no partial data is carried.
    Failure {
        /// Stable tag from [`GatewayError::kind`].
        kind: String,
        /// Human-readable description of the failure.
        message: String,
    },
}

impl ToolOutcome {
    /// Creates a successful outcome.
    pub fn success(data: serde_json::Value) -> Self {
        Self::Success { data }
    }

    /// Creates a failed outcome with an explicit kind tag.
    pub fn failure(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failure {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Whether this outcome is the failure arm.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

impl From<GatewayError> for ToolOutcome {
    fn from(err: GatewayError) -> Self {
        Self::Failure {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}
