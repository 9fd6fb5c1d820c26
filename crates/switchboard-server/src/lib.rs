//! MCP transport and bootstrap for the Switchboard gateway.
//!
//! The transport speaks JSON-RPC 2.0 over a single HTTP POST endpoint and
//! is the only layer that knows about MCP content items; everything below
//! it works in terms of [`switchboard_core::ToolOutcome`].

/// JSON-RPC 2.0 request handling.
pub mod mcp;
/// Axum router and HTTP handlers.
pub mod server;

use switchboard_core::{GatewayResult, ToolRegistry};
use switchboard_gmail::GmailConfig;
use switchboard_jira::JiraConfig;
use switchboard_slack::SlackConfig;
use tracing::info;

/// Builds the full registry from environment configuration.
///
/// Each provider registers its complete tool set regardless of whether its
/// configuration is present; an unconfigured provider's tools answer with a
/// `missing_config` failure and never reach the network.
pub fn build_registry() -> GatewayResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    let jira = JiraConfig::from_env();
    info!(configured = jira.is_some(), "Jira provider");
    switchboard_jira::register_tools(&mut registry, jira)?;

    let slack = SlackConfig::from_env();
    info!(configured = slack.is_some(), "Slack provider");
    switchboard_slack::register_tools(&mut registry, slack)?;

    let gmail = GmailConfig::from_env();
    info!(token_store = %gmail.token_path.display(), "Gmail provider");
    switchboard_gmail::register_tools(&mut registry, gmail)?;

    info!(tools = registry.tool_count(), "Registry initialized");
    Ok(registry)
}
