use crate::client::JiraClient;
use crate::config::JiraConfig;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use switchboard_core::{args, GatewayError, GatewayResult, Tool, ToolDescriptor, ToolRegistry};
use tracing::info;

/// Shared state for the Jira tools: the resolved configuration, if any.
///
/// The client itself is constructed per invocation; only the configuration
/// outlives a call.
struct JiraProvider {
    config: Option<JiraConfig>,
}

impl JiraProvider {
    fn client(&self) -> GatewayResult<JiraClient> {
        let config = self.config.as_ref().ok_or_else(|| {
            GatewayError::MissingConfig(
                "Jira configuration missing. Set JIRA_BASE_URL, JIRA_EMAIL, JIRA_API_TOKEN".into(),
            )
        })?;
        Ok(JiraClient::new(config))
    }
}

/// Registers the Jira tools with the registry.
///
/// Called once at startup. With `config == None` the tools still register
/// and every invocation short-circuits to a `missing_config` failure.
pub fn register_tools(
    registry: &mut ToolRegistry,
    config: Option<JiraConfig>,
) -> GatewayResult<()> {
    let provider = Arc::new(JiraProvider { config });
    registry.register(Arc::new(GetIssueTool::new(provider.clone())))?;
    registry.register(Arc::new(SearchIssuesTool::new(provider.clone())))?;
    registry.register(Arc::new(AddCommentTool::new(provider)))?;
    Ok(())
}

// ── get_issue ───────────────────────────────────────────────────────────────

struct GetIssueTool {
    descriptor: ToolDescriptor,
    provider: Arc<JiraProvider>,
}

impl GetIssueTool {
    fn new(provider: Arc<JiraProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "get_issue".to_string(),
                description: "Retrieve a full Jira issue with comments and attachments."
                    .to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "issue_key": {
                            "type": "string",
                            "description": "Issue key, e.g. 'PROJ-42'"
                        }
                    },
                    "required": ["issue_key"]
                }),
            },
            provider,
        }
    }
}

#[async_trait]
impl Tool for GetIssueTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        let issue_key = args::required_str(&arguments, "issue_key")?;
        let client = self.provider.client()?;
        info!(issue = %issue_key, "Fetching Jira issue");
        let detail = client.get_issue(issue_key).await?;
        Ok(serde_json::to_value(detail)?)
    }
}

// ── search_issues ───────────────────────────────────────────────────────────

struct SearchIssuesTool {
    descriptor: ToolDescriptor,
    provider: Arc<JiraProvider>,
}

impl SearchIssuesTool {
    fn new(provider: Arc<JiraProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "search_issues".to_string(),
                description: "Search Jira issues using JQL.".to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "jql": {
                            "type": "string",
                            "description": "JQL query string"
                        },
                        "max_results": {
                            "type": "integer",
                            "description": "Maximum issues to return (default 30)"
                        }
                    },
                    "required": ["jql"]
                }),
            },
            provider,
        }
    }
}

#[async_trait]
impl Tool for SearchIssuesTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        // Argument validation precedes credential resolution and any request.
        let jql = args::required_str(&arguments, "jql")?;
        let max_results = args::u64_or(&arguments, "max_results", 30);
        let client = self.provider.client()?;
        info!(max_results, "Searching Jira issues");
        let issues = client.search(jql, max_results).await?;
        Ok(serde_json::to_value(issues)?)
    }
}

// ── add_jira_comment ────────────────────────────────────────────────────────

struct AddCommentTool {
    descriptor: ToolDescriptor,
    provider: Arc<JiraProvider>,
}

impl AddCommentTool {
    fn new(provider: Arc<JiraProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "add_jira_comment".to_string(),
                description: "Add a comment to a Jira issue.".to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "issue_key": {
                            "type": "string",
                            "description": "Issue key, e.g. 'PROJ-42'"
                        },
                        "body": {
                            "type": "string",
                            "description": "Comment text"
                        }
                    },
                    "required": ["issue_key", "body"]
                }),
            },
            provider,
        }
    }
}

#[async_trait]
impl Tool for AddCommentTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        let issue_key = args::required_str(&arguments, "issue_key")?;
        let body = args::required_str(&arguments, "body")?;
        let client = self.provider.client()?;
        info!(issue = %issue_key, "Adding Jira comment");
        let created = client.add_comment(issue_key, body).await?;
        Ok(serde_json::to_value(created)?)
    }
}
