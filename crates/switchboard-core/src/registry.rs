use crate::error::{GatewayError, GatewayResult};
use crate::outcome::ToolOutcome;
use crate::tool::{Tool, ToolDescriptor};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Process-wide table mapping tool name → handler.
///
/// Constructed explicitly at startup and populated by each provider's
/// `register_tools` function; there is no dynamic registration or
/// unregistration after that.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its descriptor name.
    ///
    /// Names are globally unique; a second registration under the same name
    /// is a bootstrap defect and is rejected.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> GatewayResult<()> {
        let name = tool.descriptor().name.clone();
        if self.tools.contains_key(&name) {
            return Err(GatewayError::Internal(format!(
                "tool '{name}' is already registered"
            )));
        }
        info!(tool = %name, "Registered tool");
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Looks up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Descriptors of all registered tools, sorted by name.
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        let mut descriptors: Vec<_> = self.tools.values().map(|t| t.descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Number of registered tools.
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Invokes a tool by name and normalizes the result.
    ///
    /// Every handler error is caught here and converted into the failure
    /// arm of [`ToolOutcome`]; nothing propagates to the transport.
    pub async fn dispatch(&self, name: &str, args: serde_json::Value) -> ToolOutcome {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = %name, "Dispatch to unknown tool");
            return ToolOutcome::from(GatewayError::ToolNotFound(name.to_string()));
        };
        match tool.invoke(args).await {
            Ok(data) => ToolOutcome::success(data),
            Err(err) => {
                warn!(tool = %name, error = %err, "Tool invocation failed");
                ToolOutcome::from(err)
            }
        }
    }
}
