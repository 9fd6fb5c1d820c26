use thiserror::Error;

/// A convenience `Result` alias using [`GatewayError`].
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Top-level error type for the gateway.
///
/// Every provider operation converges on this enum; nothing vendor-specific
/// crosses the adapter boundary. The variant determines the stable `kind`
/// tag carried by the normalized envelope.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required credential or configuration value is absent.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// A caller-supplied argument is invalid; rejected before any network call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The vendor API returned an error response.
    #[error("Backend error: {0}")]
    Backend(String),

    /// A local filesystem precondition failed.
    #[error("Local IO error: {0}")]
    LocalIo(String),

    /// Dispatch target is not registered.
    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    /// An internal invariant was violated (e.g. duplicate registration).
    #[error("Internal error: {0}")]
    Internal(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Stable machine-readable tag for this error, carried by the envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingConfig(_) => "missing_config",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Backend(_) => "backend",
            Self::LocalIo(_) => "local_io",
            Self::ToolNotFound(_) => "tool_not_found",
            Self::Internal(_) | Self::Json(_) | Self::Io(_) => "internal",
        }
    }
}
