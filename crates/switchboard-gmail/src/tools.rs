use crate::auth::{self, GmailSession};
use crate::client::GmailClient;
use crate::config::GmailConfig;
use crate::mime::{self, BodyPreference};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use switchboard_core::{args, GatewayResult, Tool, ToolDescriptor, ToolRegistry};
use tracing::info;

const LIST_PAGE_SIZE: u64 = 5;

/// Shared state for the Gmail tools: configuration plus the lazily
/// resolved, process-cached session.
struct GmailProvider {
    config: GmailConfig,
    session: Mutex<Option<Arc<GmailSession>>>,
}

impl GmailProvider {
    fn new(config: GmailConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    /// Returns a client over a valid session, resolving one on first use or
    /// after expiry. Concurrent resolutions may race; the last writer wins.
    async fn client(&self) -> GatewayResult<GmailClient> {
        if let Some(session) = self.session.lock().clone() {
            if !session.expired() {
                return Ok(GmailClient::new(&self.config, &session));
            }
        }
        let session = Arc::new(auth::resolve_session(&self.config).await?);
        *self.session.lock() = Some(session.clone());
        Ok(GmailClient::new(&self.config, &session))
    }
}

/// Registers the Gmail tools with the registry.
///
/// Registration never touches the network; a mailbox with no credential
/// sources fails at invocation time with a `missing_config` failure.
pub fn register_tools(registry: &mut ToolRegistry, config: GmailConfig) -> GatewayResult<()> {
    let provider = Arc::new(GmailProvider::new(config));
    registry.register(Arc::new(ListEmailsTool::new(provider.clone())))?;
    registry.register(Arc::new(GetEmailTool::new(provider.clone())))?;
    registry.register(Arc::new(ListLabelsTool::new(provider.clone())))?;
    registry.register(Arc::new(SearchTool::new(provider.clone())))?;
    registry.register(Arc::new(GetThreadTool::new(provider)))?;
    Ok(())
}

/// Summary row assembled from a metadata-only fetch.
#[derive(Debug, Serialize)]
struct EmailSummary {
    id: Option<String>,
    #[serde(rename = "threadId")]
    thread_id: Option<String>,
    subject: Option<String>,
    from: Option<String>,
    date: Option<String>,
    snippet: Option<String>,
}

/// One message within a thread view.
#[derive(Debug, Serialize)]
struct ThreadMessage {
    id: Option<String>,
    subject: Option<String>,
    from: Option<String>,
    to: Option<String>,
    date: Option<String>,
    snippet: Option<String>,
    body: Option<String>,
}

// ── list_emails ─────────────────────────────────────────────────────────────

struct ListEmailsTool {
    descriptor: ToolDescriptor,
    provider: Arc<GmailProvider>,
}

impl ListEmailsTool {
    fn new(provider: Arc<GmailProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "list_emails".to_string(),
                description: "List recent emails matching an optional Gmail query.".to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "q": {"type": "string", "description": "Gmail search query (optional)"}
                    }
                }),
            },
            provider,
        }
    }
}

#[async_trait]
impl Tool for ListEmailsTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        let query = args::optional_str(&arguments, "q").unwrap_or_default();
        let client = self.provider.client().await?;
        let messages = client.list_messages(query, LIST_PAGE_SIZE).await?;
        Ok(json!({ "messages": messages }))
    }
}

// ── get_email ───────────────────────────────────────────────────────────────

struct GetEmailTool {
    descriptor: ToolDescriptor,
    provider: Arc<GmailProvider>,
}

impl GetEmailTool {
    fn new(provider: Arc<GmailProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "get_email".to_string(),
                description: "Fetch a full email by id, including raw headers and body encoding."
                    .to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string", "description": "Message id"}
                    },
                    "required": ["id"]
                }),
            },
            provider,
        }
    }
}

#[async_trait]
impl Tool for GetEmailTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        let id = args::required_str(&arguments, "id")?;
        let client = self.provider.client().await?;
        client.get_message_full(id).await
    }
}

// ── list_gmail_labels ───────────────────────────────────────────────────────

struct ListLabelsTool {
    descriptor: ToolDescriptor,
    provider: Arc<GmailProvider>,
}

impl ListLabelsTool {
    fn new(provider: Arc<GmailProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "list_gmail_labels".to_string(),
                description: "List the mailbox's labels.".to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {}
                }),
            },
            provider,
        }
    }
}

#[async_trait]
impl Tool for ListLabelsTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, _arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        let client = self.provider.client().await?;
        let labels = client.list_labels().await?;
        Ok(json!({ "labels": labels }))
    }
}

// ── search_gmail ────────────────────────────────────────────────────────────

struct SearchTool {
    descriptor: ToolDescriptor,
    provider: Arc<GmailProvider>,
}

impl SearchTool {
    fn new(provider: Arc<GmailProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "search_gmail".to_string(),
                description: "Search emails and return compact summaries.".to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "q": {"type": "string", "description": "Gmail search query (optional)"},
                        "max_results": {"type": "integer", "description": "Maximum messages to summarize (default 10)"}
                    }
                }),
            },
            provider,
        }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        let query = args::optional_str(&arguments, "q").unwrap_or_default();
        let max_results = args::u64_or(&arguments, "max_results", 10);
        let client = self.provider.client().await?;
        info!(max_results, "Searching mailbox");

        // One metadata fetch per listed id. The extra round trips keep the
        // summary assembly trivial; callers bound the cost via max_results.
        let refs = client.list_messages(query, max_results).await?;
        let mut summaries = Vec::with_capacity(refs.len());
        for message_ref in &refs {
            let envelope = client.get_message_metadata(&message_ref.id).await?;
            let headers = envelope
                .payload
                .as_ref()
                .map(|p| p.headers.as_slice())
                .unwrap_or_default();
            summaries.push(EmailSummary {
                id: envelope.id.clone(),
                thread_id: envelope.thread_id.clone(),
                subject: mime::header_value(headers, "Subject").map(ToString::to_string),
                from: mime::header_value(headers, "From").map(ToString::to_string),
                date: mime::header_value(headers, "Date").map(ToString::to_string),
                snippet: envelope.snippet.clone(),
            });
        }
        Ok(json!({ "messages": summaries }))
    }
}

// ── get_gmail_thread ────────────────────────────────────────────────────────

struct GetThreadTool {
    descriptor: ToolDescriptor,
    provider: Arc<GmailProvider>,
}

impl GetThreadTool {
    fn new(provider: Arc<GmailProvider>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "get_gmail_thread".to_string(),
                description: "Fetch a thread and extract one textual body per message."
                    .to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "thread_id": {"type": "string", "description": "Thread id"},
                        "prefer_body": {
                            "type": "string",
                            "enum": ["plain", "html"],
                            "description": "Preferred body type (default 'plain')"
                        }
                    },
                    "required": ["thread_id"]
                }),
            },
            provider,
        }
    }
}

#[async_trait]
impl Tool for GetThreadTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: serde_json::Value) -> GatewayResult<serde_json::Value> {
        let thread_id = args::required_str(&arguments, "thread_id")?;
        let prefer =
            BodyPreference::parse(args::optional_str(&arguments, "prefer_body").unwrap_or("plain"));
        let client = self.provider.client().await?;
        let thread = client.get_thread(thread_id).await?;

        let messages: Vec<ThreadMessage> = thread
            .messages
            .iter()
            .map(|envelope| {
                let headers = envelope
                    .payload
                    .as_ref()
                    .map(|p| p.headers.as_slice())
                    .unwrap_or_default();
                ThreadMessage {
                    id: envelope.id.clone(),
                    subject: mime::header_value(headers, "Subject").map(ToString::to_string),
                    from: mime::header_value(headers, "From").map(ToString::to_string),
                    to: mime::header_value(headers, "To").map(ToString::to_string),
                    date: mime::header_value(headers, "Date").map(ToString::to_string),
                    snippet: envelope.snippet.clone(),
                    body: envelope
                        .payload
                        .as_ref()
                        .and_then(|payload| mime::extract_text(payload, prefer)),
                }
            })
            .collect();

        Ok(json!({ "id": thread.id, "messages": messages }))
    }
}
