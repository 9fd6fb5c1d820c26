use crate::config::SlackConfig;
use serde::{Deserialize, Serialize};
use switchboard_core::{GatewayError, GatewayResult};
use tracing::debug;

/// Thin wrapper over the Slack Web API for one workspace.
///
/// Every method posts form-encoded (or multipart) parameters with bearer
/// auth and decodes the standard `{ok, error}` envelope; an `ok: false`
/// response surfaces the provider's error code as a `Backend` error.
pub struct SlackClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

// ── Projections ─────────────────────────────────────────────────────────────

/// Compact channel view.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel id.
    pub id: Option<String>,
    /// Channel name.
    pub name: Option<String>,
    /// Whether the channel is private.
    pub is_private: Option<bool>,
    /// Whether the channel is archived.
    pub is_archived: Option<bool>,
}

/// Channel id/name pair returned by create and join.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelRef {
    /// Channel id.
    pub id: Option<String>,
    /// Channel name.
    pub name: Option<String>,
}

/// Compact workspace member view.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    /// Member id.
    pub id: Option<String>,
    /// Account name.
    pub name: Option<String>,
    /// Display name.
    pub real_name: Option<String>,
    /// Whether this member is a bot.
    pub is_bot: Option<bool>,
    /// Whether this member is deactivated.
    pub deleted: Option<bool>,
}

/// One page of channel history; messages pass through opaquely.
#[derive(Debug, Serialize)]
pub struct HistoryPage {
    /// Raw message objects as returned by the API.
    pub messages: serde_json::Value,
    /// Whether another page exists.
    pub has_more: bool,
    /// Cursor for the next page, if any.
    pub next_cursor: Option<String>,
}

/// One page of workspace members.
#[derive(Debug, Serialize)]
pub struct UsersPage {
    /// Member projections.
    pub members: Vec<UserInfo>,
    /// Cursor for the next page, if any.
    pub next_cursor: Option<String>,
}

/// Normalized uploaded-file view; identical for both upload paths.
#[derive(Debug, Serialize)]
pub struct FileRef {
    /// File id.
    pub id: Option<String>,
    /// File name, falling back to the title.
    pub name: Option<String>,
    /// File title.
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadTicket {
    upload_url: String,
    file_id: String,
}

// ── Implementation ──────────────────────────────────────────────────────────

impl SlackClient {
    /// Builds a client from the given workspace configuration.
    pub fn new(config: &SlackConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: config.bot_token.clone(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Posts a message, optionally into a thread.
    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> GatewayResult<serde_json::Value> {
        let mut params = vec![("channel", channel.to_string()), ("text", text.to_string())];
        if let Some(ts) = thread_ts {
            params.push(("thread_ts", ts.to_string()));
        }
        let body = self.call("chat.postMessage", &params).await?;
        Ok(serde_json::json!({
            "ts": body.get("ts"),
            "channel": body.get("channel"),
        }))
    }

    /// Lists conversations of the given comma-separated types.
    pub async fn list_channels(&self, types: &str) -> GatewayResult<Vec<ChannelInfo>> {
        let body = self
            .call("conversations.list", &[("types", types.to_string())])
            .await?;
        let channels = body
            .get("channels")
            .cloned()
            .unwrap_or(serde_json::Value::Array(vec![]));
        Ok(serde_json::from_value(channels)?)
    }

    /// Fetches one page of channel history, forwarding the pagination cursor.
    #[allow(clippy::too_many_arguments)]
    pub async fn channel_history(
        &self,
        channel: &str,
        limit: u64,
        oldest: Option<&str>,
        latest: Option<&str>,
        inclusive: bool,
        cursor: Option<&str>,
    ) -> GatewayResult<HistoryPage> {
        let mut params = vec![
            ("channel", channel.to_string()),
            ("limit", limit.to_string()),
            ("inclusive", inclusive.to_string()),
        ];
        if let Some(oldest) = oldest {
            params.push(("oldest", oldest.to_string()));
        }
        if let Some(latest) = latest {
            params.push(("latest", latest.to_string()));
        }
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        let body = self.call("conversations.history", &params).await?;
        Ok(HistoryPage {
            messages: body
                .get("messages")
                .cloned()
                .unwrap_or(serde_json::Value::Array(vec![])),
            has_more: body.get("has_more").and_then(|v| v.as_bool()).unwrap_or(false),
            next_cursor: next_cursor(&body),
        })
    }

    /// Lists workspace members.
    pub async fn list_users(&self, limit: u64, cursor: Option<&str>) -> GatewayResult<UsersPage> {
        let mut params = vec![("limit", limit.to_string())];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        let body = self.call("users.list", &params).await?;
        let members = body
            .get("members")
            .cloned()
            .unwrap_or(serde_json::Value::Array(vec![]));
        Ok(UsersPage {
            members: serde_json::from_value(members)?,
            next_cursor: next_cursor(&body),
        })
    }

    /// Creates a channel.
    pub async fn create_channel(&self, name: &str, is_private: bool) -> GatewayResult<ChannelRef> {
        let body = self
            .call(
                "conversations.create",
                &[
                    ("name", name.to_string()),
                    ("is_private", is_private.to_string()),
                ],
            )
            .await?;
        Ok(channel_ref(&body))
    }

    /// Archives a channel by id.
    pub async fn archive_channel(&self, channel: &str) -> GatewayResult<()> {
        self.call("conversations.archive", &[("channel", channel.to_string())])
            .await?;
        Ok(())
    }

    /// Joins a channel by id.
    pub async fn join_channel(&self, channel: &str) -> GatewayResult<ChannelRef> {
        let body = self
            .call("conversations.join", &[("channel", channel.to_string())])
            .await?;
        Ok(channel_ref(&body))
    }

    /// Adds an emoji reaction to a message.
    pub async fn add_reaction(
        &self,
        channel: &str,
        timestamp: &str,
        emoji_name: &str,
    ) -> GatewayResult<()> {
        self.call(
            "reactions.add",
            &[
                ("channel", channel.to_string()),
                ("timestamp", timestamp.to_string()),
                ("name", emoji_name.to_string()),
            ],
        )
        .await?;
        Ok(())
    }

    /// Uploads a file to a single channel through the external-upload
    /// sequence: reserve an upload URL, send the bytes, then complete.
    pub async fn upload_external(
        &self,
        channel: &str,
        filename: &str,
        bytes: Vec<u8>,
        title: Option<&str>,
        initial_comment: Option<&str>,
        thread_ts: Option<&str>,
    ) -> GatewayResult<FileRef> {
        let body = self
            .call(
                "files.getUploadURLExternal",
                &[
                    ("filename", filename.to_string()),
                    ("length", bytes.len().to_string()),
                ],
            )
            .await?;
        let ticket: UploadTicket = serde_json::from_value(body)?;

        debug!(file_id = %ticket.file_id, "Posting file bytes to upload URL");
        self.http
            .post(&ticket.upload_url)
            .body(bytes)
            .send()
            .await
            .map_err(|e| GatewayError::Backend(format!("Slack upload error: {e}")))?
            .error_for_status()
            .map_err(|e| GatewayError::Backend(format!("Slack upload error: {e}")))?;

        let mut file_entry = serde_json::json!({ "id": ticket.file_id });
        if let Some(title) = title {
            file_entry["title"] = serde_json::Value::String(title.to_string());
        }
        let mut complete = serde_json::json!({
            "files": [file_entry],
            "channel_id": channel,
        });
        if let Some(comment) = initial_comment {
            complete["initial_comment"] = serde_json::Value::String(comment.to_string());
        }
        if let Some(ts) = thread_ts {
            complete["thread_ts"] = serde_json::Value::String(ts.to_string());
        }
        let body = self.call_json("files.completeUploadExternal", &complete).await?;
        Ok(file_ref(&body))
    }

    /// Uploads a file to one or more channels through the legacy multipart
    /// endpoint. `channels` is comma-joined channel ids.
    pub async fn upload_legacy(
        &self,
        channels: &str,
        filename: &str,
        bytes: Vec<u8>,
        title: Option<&str>,
        initial_comment: Option<&str>,
        thread_ts: Option<&str>,
    ) -> GatewayResult<FileRef> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let mut form = reqwest::multipart::Form::new()
            .text("channels", channels.to_string())
            .part("file", part);
        if let Some(title) = title {
            form = form.text("title", title.to_string());
        }
        if let Some(comment) = initial_comment {
            form = form.text("initial_comment", comment.to_string());
        }
        if let Some(ts) = thread_ts {
            form = form.text("thread_ts", ts.to_string());
        }

        let response = self
            .http
            .post(format!("{}/files.upload", self.base_url))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| GatewayError::Backend(format!("Slack request error: {e}")))?;
        let body = decode_envelope(response).await?;
        Ok(file_ref(&body))
    }

    /// Posts a form-encoded Web API call and decodes the `{ok, error}`
    /// envelope.
    async fn call(
        &self,
        api_method: &str,
        params: &[(&str, String)],
    ) -> GatewayResult<serde_json::Value> {
        let response = self
            .http
            .post(format!("{}/{api_method}", self.base_url))
            .bearer_auth(&self.token)
            .form(params)
            .send()
            .await
            .map_err(|e| GatewayError::Backend(format!("Slack request error: {e}")))?;
        decode_envelope(response).await
    }

    /// Like `call`, but with a JSON body (required by the external-upload
    /// completion method).
    async fn call_json(
        &self,
        api_method: &str,
        payload: &serde_json::Value,
    ) -> GatewayResult<serde_json::Value> {
        let response = self
            .http
            .post(format!("{}/{api_method}", self.base_url))
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await
            .map_err(|e| GatewayError::Backend(format!("Slack request error: {e}")))?;
        decode_envelope(response).await
    }
}

async fn decode_envelope(response: reqwest::Response) -> GatewayResult<serde_json::Value> {
    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| GatewayError::Backend(format!("Slack response parse error: {e}")))?;
    if body.get("ok").and_then(|v| v.as_bool()) != Some(true) {
        let code = body
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown_error");
        return Err(GatewayError::Backend(code.to_string()));
    }
    Ok(body)
}

fn next_cursor(body: &serde_json::Value) -> Option<String> {
    body.get("response_metadata")
        .and_then(|m| m.get("next_cursor"))
        .and_then(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .map(ToString::to_string)
}

fn channel_ref(body: &serde_json::Value) -> ChannelRef {
    let channel = body.get("channel");
    ChannelRef {
        id: channel
            .and_then(|c| c.get("id"))
            .and_then(|v| v.as_str())
            .map(ToString::to_string),
        name: channel
            .and_then(|c| c.get("name"))
            .and_then(|v| v.as_str())
            .map(ToString::to_string),
    }
}

/// Extracts the file object from either upload response shape: `file` for
/// the legacy endpoint, `files[0]` for the external-upload completion.
fn file_ref(body: &serde_json::Value) -> FileRef {
    let file = body
        .get("file")
        .filter(|f| !f.is_null())
        .or_else(|| body.get("files").and_then(|fs| fs.get(0)));
    let get = |key: &str| {
        file.and_then(|f| f.get(key))
            .and_then(|v| v.as_str())
            .map(ToString::to_string)
    };
    let title = get("title");
    FileRef {
        id: get("id"),
        name: get("name").or_else(|| title.clone()),
        title,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_ref_reads_both_response_shapes() {
        let legacy = json!({"ok": true, "file": {"id": "F1", "name": "a.txt", "title": "A"}});
        let v2 = json!({"ok": true, "files": [{"id": "F2", "title": "B"}]});

        let from_legacy = file_ref(&legacy);
        assert_eq!(from_legacy.id.as_deref(), Some("F1"));
        assert_eq!(from_legacy.name.as_deref(), Some("a.txt"));

        let from_v2 = file_ref(&v2);
        assert_eq!(from_v2.id.as_deref(), Some("F2"));
        // Name falls back to the title when the API omits it.
        assert_eq!(from_v2.name.as_deref(), Some("B"));
    }

    #[test]
    fn empty_next_cursor_becomes_none() {
        let body = json!({"response_metadata": {"next_cursor": ""}});
        assert!(next_cursor(&body).is_none());
        let body = json!({"response_metadata": {"next_cursor": "abc"}});
        assert_eq!(next_cursor(&body).as_deref(), Some("abc"));
    }
}
