use crate::client::SlackClient;
use crate::config::SlackConfig;
use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use switchboard_core::{args, GatewayError, GatewayResult, Tool, ToolDescriptor, ToolRegistry};
use tracing::info;

/// Shared state for the Slack tools: the resolved configuration, if any.
struct SlackProvider {
    config: Option<SlackConfig>,
}

impl SlackProvider {
    fn client(&self) -> GatewayResult<SlackClient> {
        let config = self.config.as_ref().ok_or_else(|| {
            GatewayError::MissingConfig("Slack not configured. Set SLACK_BOT_TOKEN".into())
        })?;
        Ok(SlackClient::new(config))
    }
}

/// Registers the Slack tools with the registry.
///
/// With `config == None` the tools still register and every invocation
/// short-circuits to a `missing_config` failure without any call.
pub fn register_tools(
    registry: &mut ToolRegistry,
    config: Option<SlackConfig>,
) -> GatewayResult<()> {
    let provider = Arc::new(SlackProvider { config });
    registry.register(Arc::new(PostMessageTool::new(provider.clone())))?;
    registry.register(Arc::new(ListChannelsTool::new(provider.clone())))?;
    registry.register(Arc::new(ChannelHistoryTool::new(provider.clone())))?;
    registry.register(Arc::new(ListUsersTool::new(provider.clone())))?;
    registry.register(Arc::new(CreateChannelTool::new(provider.clone())))?;
    registry.register(Arc::new(ArchiveChannelTool::new(provider.clone())))?;
    registry.register(Arc::new(JoinChannelTool::new(provider.clone())))?;
    registry.register(Arc::new(AddReactionTool::new(provider.clone())))?;
    registry.register(Arc::new(UploadFileTool::new(provider)))?;
    Ok(())
}

// ── post_slack_message ──────────────────────────────────────────────────────

struct PostMessageTool {
    descriptor: ToolDescriptor,
    provider: Arc<SlackProvider>,
}

impl PostMessageTool {
    fn new(provider: Arc<SlackProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "post_slack_message".to_string(),
                description: "Post a message to a Slack channel, optionally in a thread."
                    .to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "channel": {"type": "string", "description": "Channel ID, e.g. 'C123...'"},
                        "text": {"type": "string", "description": "Message text"},
                        "thread_ts": {"type": "string", "description": "Thread timestamp to reply under"}
                    },
                    "required": ["channel", "text"]
                }),
            },
            provider,
        }
    }
}

#[async_trait]
impl Tool for PostMessageTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        let client = self.provider.client()?;
        let channel = args::required_str(&arguments, "channel")?;
        let text = args::required_str(&arguments, "text")?;
        let thread_ts = args::optional_str(&arguments, "thread_ts");
        info!(channel = %channel, "Posting Slack message");
        client.post_message(channel, text, thread_ts).await
    }
}

// ── list_slack_channels ─────────────────────────────────────────────────────

struct ListChannelsTool {
    descriptor: ToolDescriptor,
    provider: Arc<SlackProvider>,
}

impl ListChannelsTool {
    fn new(provider: Arc<SlackProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "list_slack_channels".to_string(),
                description: "List Slack conversations by types (comma-separated).".to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "types": {
                            "type": "string",
                            "description": "Conversation types (default 'public_channel')"
                        }
                    }
                }),
            },
            provider,
        }
    }
}

#[async_trait]
impl Tool for ListChannelsTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        let client = self.provider.client()?;
        let types = args::optional_str(&arguments, "types").unwrap_or("public_channel");
        let channels = client.list_channels(types).await?;
        Ok(json!({ "channels": channels }))
    }
}

// ── get_channel_history ─────────────────────────────────────────────────────

struct ChannelHistoryTool {
    descriptor: ToolDescriptor,
    provider: Arc<SlackProvider>,
}

impl ChannelHistoryTool {
    fn new(provider: Arc<SlackProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "get_channel_history".to_string(),
                description: "Get message history for a channel with cursor pagination."
                    .to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "channel": {"type": "string", "description": "Channel ID"},
                        "limit": {"type": "integer", "description": "Max messages to return (default 50)"},
                        "oldest": {"type": "string", "description": "Only messages after this ts"},
                        "latest": {"type": "string", "description": "Only messages before this ts"},
                        "inclusive": {"type": "boolean", "description": "Include oldest/latest messages (default false)"},
                        "cursor": {"type": "string", "description": "Pagination cursor from a previous call"}
                    },
                    "required": ["channel"]
                }),
            },
            provider,
        }
    }
}

#[async_trait]
impl Tool for ChannelHistoryTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        let client = self.provider.client()?;
        let channel = args::required_str(&arguments, "channel")?;
        let page = client
            .channel_history(
                channel,
                args::u64_or(&arguments, "limit", 50),
                args::optional_str(&arguments, "oldest"),
                args::optional_str(&arguments, "latest"),
                args::bool_or(&arguments, "inclusive", false),
                args::optional_str(&arguments, "cursor"),
            )
            .await?;
        Ok(serde_json::to_value(page)?)
    }
}

// ── list_users ──────────────────────────────────────────────────────────────

struct ListUsersTool {
    descriptor: ToolDescriptor,
    provider: Arc<SlackProvider>,
}

impl ListUsersTool {
    fn new(provider: Arc<SlackProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "list_users".to_string(),
                description: "List users in the workspace.".to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "limit": {"type": "integer", "description": "Max members per page (default 200)"},
                        "cursor": {"type": "string", "description": "Pagination cursor from a previous call"}
                    }
                }),
            },
            provider,
        }
    }
}

#[async_trait]
impl Tool for ListUsersTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        let client = self.provider.client()?;
        let page = client
            .list_users(
                args::u64_or(&arguments, "limit", 200),
                args::optional_str(&arguments, "cursor"),
            )
            .await?;
        Ok(serde_json::to_value(page)?)
    }
}

// ── create_channel ──────────────────────────────────────────────────────────

struct CreateChannelTool {
    descriptor: ToolDescriptor,
    provider: Arc<SlackProvider>,
}

impl CreateChannelTool {
    fn new(provider: Arc<SlackProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "create_channel".to_string(),
                description: "Create a new Slack channel.".to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "name": {"type": "string", "description": "Channel name"},
                        "is_private": {"type": "boolean", "description": "Create as private (default false)"}
                    },
                    "required": ["name"]
                }),
            },
            provider,
        }
    }
}

#[async_trait]
impl Tool for CreateChannelTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        let client = self.provider.client()?;
        let name = args::required_str(&arguments, "name")?;
        let is_private = args::bool_or(&arguments, "is_private", false);
        info!(channel = %name, is_private, "Creating Slack channel");
        let channel = client.create_channel(name, is_private).await?;
        Ok(json!({ "channel": channel }))
    }
}

// ── archive_channel ─────────────────────────────────────────────────────────

struct ArchiveChannelTool {
    descriptor: ToolDescriptor,
    provider: Arc<SlackProvider>,
}

impl ArchiveChannelTool {
    fn new(provider: Arc<SlackProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "archive_channel".to_string(),
                description: "Archive a Slack channel by ID.".to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "channel": {"type": "string", "description": "Channel ID"}
                    },
                    "required": ["channel"]
                }),
            },
            provider,
        }
    }
}

#[async_trait]
impl Tool for ArchiveChannelTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        let client = self.provider.client()?;
        let channel = args::required_str(&arguments, "channel")?;
        info!(channel = %channel, "Archiving Slack channel");
        client.archive_channel(channel).await?;
        Ok(json!({}))
    }
}

// ── join_channel ────────────────────────────────────────────────────────────

struct JoinChannelTool {
    descriptor: ToolDescriptor,
    provider: Arc<SlackProvider>,
}

impl JoinChannelTool {
    fn new(provider: Arc<SlackProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "join_channel".to_string(),
                description: "Join a Slack channel by ID.".to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "channel": {"type": "string", "description": "Channel ID"}
                    },
                    "required": ["channel"]
                }),
            },
            provider,
        }
    }
}

#[async_trait]
impl Tool for JoinChannelTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        let client = self.provider.client()?;
        let channel = args::required_str(&arguments, "channel")?;
        let joined = client.join_channel(channel).await?;
        Ok(json!({ "channel": joined }))
    }
}

// ── add_reaction ────────────────────────────────────────────────────────────

struct AddReactionTool {
    descriptor: ToolDescriptor,
    provider: Arc<SlackProvider>,
}

impl AddReactionTool {
    fn new(provider: Arc<SlackProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "add_reaction".to_string(),
                description: "Add an emoji reaction to a message.".to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "channel": {"type": "string", "description": "Channel ID containing the message"},
                        "timestamp": {"type": "string", "description": "Message ts to react to"},
                        "emoji_name": {"type": "string", "description": "Emoji name without colons, e.g. 'thumbsup'"}
                    },
                    "required": ["channel", "timestamp", "emoji_name"]
                }),
            },
            provider,
        }
    }
}

#[async_trait]
impl Tool for AddReactionTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        let client = self.provider.client()?;
        let channel = args::required_str(&arguments, "channel")?;
        let timestamp = args::required_str(&arguments, "timestamp")?;
        let emoji_name = args::required_str(&arguments, "emoji_name")?;
        client.add_reaction(channel, timestamp, emoji_name).await?;
        Ok(json!({}))
    }
}

// ── upload_file ─────────────────────────────────────────────────────────────

struct UploadFileTool {
    descriptor: ToolDescriptor,
    provider: Arc<SlackProvider>,
}

impl UploadFileTool {
    fn new(provider: Arc<SlackProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "upload_file".to_string(),
                description: "Upload a local file to one or more Slack channels.".to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "channels": {
                            "description": "Target channel ID, or a list of channel IDs",
                            "anyOf": [
                                {"type": "string"},
                                {"type": "array", "items": {"type": "string"}}
                            ]
                        },
                        "filepath": {"type": "string", "description": "Path to the file to upload"},
                        "title": {"type": "string", "description": "File title"},
                        "initial_comment": {"type": "string", "description": "Message posted alongside the file"},
                        "thread_ts": {"type": "string", "description": "Thread timestamp to attach the file under"}
                    },
                    "required": ["channels", "filepath"]
                }),
            },
            provider,
        }
    }
}

/// Accepts a single channel id or a list of ids.
fn channel_targets(arguments: &serde_json::Value) -> GatewayResult<Vec<String>> {
    let channels = match arguments.get("channels") {
        Some(serde_json::Value::String(s)) if !s.is_empty() => vec![s.clone()],
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
        _ => vec![],
    };
    if channels.is_empty() {
        return Err(GatewayError::InvalidArgument("channels is required".into()));
    }
    Ok(channels)
}

/// Canonicalizes the path and requires an existing regular file before any
/// handle is opened. Traversal sequences and dangling paths both end here.
async fn validated_file(filepath: &str) -> GatewayResult<(PathBuf, String)> {
    let realpath = tokio::fs::canonicalize(filepath)
        .await
        .map_err(|_| GatewayError::LocalIo("File not found".into()))?;
    let metadata = tokio::fs::metadata(&realpath)
        .await
        .map_err(|_| GatewayError::LocalIo("File not found".into()))?;
    if !metadata.is_file() {
        return Err(GatewayError::LocalIo("File not found".into()));
    }
    let filename = realpath
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok((realpath, filename))
}

#[async_trait]
impl Tool for UploadFileTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        let client = self.provider.client()?;
        let channels = channel_targets(&arguments)?;
        let filepath = args::required_str(&arguments, "filepath")?;
        let title = args::optional_str(&arguments, "title");
        let initial_comment = args::optional_str(&arguments, "initial_comment");
        let thread_ts = args::optional_str(&arguments, "thread_ts");

        let (realpath, filename) = validated_file(filepath).await?;
        let bytes = tokio::fs::read(&realpath)
            .await
            .map_err(|e| GatewayError::LocalIo(format!("Failed to read file: {e}")))?;
        info!(path = %realpath.display(), size = bytes.len(), "Uploading file to Slack");

        let file = if channels.len() == 1 {
            client
                .upload_external(&channels[0], &filename, bytes, title, initial_comment, thread_ts)
                .await?
        } else {
            client
                .upload_legacy(
                    &channels.join(","),
                    &filename,
                    bytes,
                    title,
                    initial_comment,
                    thread_ts,
                )
                .await?
        };
        Ok(json!({ "file": file }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_targets_accepts_string_and_list() {
        assert_eq!(
            channel_targets(&json!({"channels": "C1"})).unwrap(),
            vec!["C1".to_string()]
        );
        assert_eq!(
            channel_targets(&json!({"channels": ["C1", "C2"]})).unwrap(),
            vec!["C1".to_string(), "C2".to_string()]
        );
        assert!(channel_targets(&json!({"channels": []})).is_err());
        assert!(channel_targets(&json!({})).is_err());
    }
}
