use crate::auth::GmailSession;
use crate::config::GmailConfig;
use crate::mime::MessagePart;
use serde::{Deserialize, Serialize};
use switchboard_core::{GatewayError, GatewayResult};

/// Thin wrapper over the Gmail REST API for one authorized session.
pub struct GmailClient {
    http: reqwest::Client,
    access_token: String,
    base_url: String,
}

// ── Wire types ──────────────────────────────────────────────────────────────

/// Reference to a message as returned by list calls.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    /// Message id.
    pub id: String,
    /// Containing thread id.
    pub thread_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListMessagesResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

/// A message fetched with headers and payload tree.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEnvelope {
    /// Message id.
    pub id: Option<String>,
    /// Containing thread id.
    pub thread_id: Option<String>,
    /// Short preview text.
    pub snippet: Option<String>,
    /// MIME part tree.
    pub payload: Option<MessagePart>,
}

/// A label id/name pair.
#[derive(Debug, Serialize, Deserialize)]
pub struct Label {
    /// Label id.
    pub id: Option<String>,
    /// Label display name.
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListLabelsResponse {
    #[serde(default)]
    labels: Vec<Label>,
}

/// A thread with its messages expanded.
#[derive(Debug, Deserialize)]
pub struct ThreadResponse {
    /// Thread id.
    pub id: Option<String>,
    /// Messages in the thread.
    #[serde(default)]
    pub messages: Vec<MessageEnvelope>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    error: ApiErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

// ── Implementation ──────────────────────────────────────────────────────────

impl GmailClient {
    /// Builds a client from the resolved session.
    pub fn new(config: &GmailConfig, session: &GmailSession) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token: session.access_token.clone(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Lists message references matching a mailbox query.
    pub async fn list_messages(
        &self,
        query: &str,
        max_results: u64,
    ) -> GatewayResult<Vec<MessageRef>> {
        let max_results = max_results.to_string();
        let response = self
            .http
            .get(format!("{}/users/me/messages", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[("q", query), ("maxResults", max_results.as_str())])
            .send()
            .await
            .map_err(request_error)?;
        let body: ListMessagesResponse = decode(response).await?;
        Ok(body.messages)
    }

    /// Fetches one message in full, passed through opaquely.
    pub async fn get_message_full(&self, id: &str) -> GatewayResult<serde_json::Value> {
        let response = self
            .http
            .get(format!("{}/users/me/messages/{id}", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[("format", "full")])
            .send()
            .await
            .map_err(request_error)?;
        decode(response).await
    }

    /// Fetches only the Subject/From/Date headers and snippet of a message.
    pub async fn get_message_metadata(&self, id: &str) -> GatewayResult<MessageEnvelope> {
        let response = self
            .http
            .get(format!("{}/users/me/messages/{id}", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[
                ("format", "metadata"),
                ("metadataHeaders", "Subject"),
                ("metadataHeaders", "From"),
                ("metadataHeaders", "Date"),
            ])
            .send()
            .await
            .map_err(request_error)?;
        decode(response).await
    }

    /// Lists the mailbox's labels.
    pub async fn list_labels(&self) -> GatewayResult<Vec<Label>> {
        let response = self
            .http
            .get(format!("{}/users/me/labels", self.base_url))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(request_error)?;
        let body: ListLabelsResponse = decode(response).await?;
        Ok(body.labels)
    }

    /// Fetches a full thread with all messages.
    pub async fn get_thread(&self, thread_id: &str) -> GatewayResult<ThreadResponse> {
        let response = self
            .http
            .get(format!("{}/users/me/threads/{thread_id}", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[("format", "full")])
            .send()
            .await
            .map_err(request_error)?;
        decode(response).await
    }
}

fn request_error(err: reqwest::Error) -> GatewayError {
    GatewayError::Backend(format!("Gmail request error: {err}"))
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> GatewayResult<T> {
    let status = response.status();
    if !status.is_success() {
        let detail: ApiErrorResponse = response.json().await.unwrap_or_default();
        let message = if detail.error.message.is_empty() {
            format!("HTTP {status}")
        } else {
            detail.error.message
        };
        return Err(GatewayError::Backend(message));
    }
    response
        .json()
        .await
        .map_err(|e| GatewayError::Backend(format!("Gmail response parse error: {e}")))
}
