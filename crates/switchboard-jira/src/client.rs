use crate::config::JiraConfig;
use serde::{Deserialize, Serialize};
use switchboard_core::{GatewayError, GatewayResult};

const ISSUE_FIELDS: &str = "summary,description,status,priority,assignee,issuetype";

/// Thin wrapper over the Jira REST API (v2) for one site.
///
/// Constructed per invocation from a resolved [`JiraConfig`]; holds no
/// state beyond the HTTP client.
pub struct JiraClient {
    http: reqwest::Client,
    base_url: String,
    email: String,
    api_token: String,
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct IssueResponse {
    key: String,
    #[serde(default)]
    fields: IssueFields,
}

#[derive(Debug, Default, Deserialize)]
struct IssueFields {
    summary: Option<String>,
    description: Option<String>,
    status: Option<NamedField>,
    priority: Option<NamedField>,
    assignee: Option<UserField>,
    issuetype: Option<NamedField>,
    #[serde(default)]
    comment: CommentContainer,
    #[serde(default)]
    attachment: Vec<AttachmentField>,
}

#[derive(Debug, Deserialize)]
struct NamedField {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserField {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CommentContainer {
    #[serde(default)]
    comments: Vec<CommentField>,
}

#[derive(Debug, Deserialize)]
struct CommentField {
    id: Option<String>,
    author: Option<UserField>,
    body: Option<String>,
    created: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttachmentField {
    id: Option<String>,
    filename: Option<String>,
    size: Option<u64>,
    created: Option<String>,
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<IssueResponse>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "errorMessages", default)]
    error_messages: Vec<String>,
}

// ── Projections returned to the gateway ─────────────────────────────────────

/// Full issue view with comments and attachments expanded.
///
/// Missing sub-fields (no assignee, no priority) serialize as `null`.
#[derive(Debug, Serialize)]
pub struct IssueDetail {
    /// Issue key, e.g. `PROJ-42`.
    pub key: String,
    /// Issue summary line.
    pub summary: Option<String>,
    /// Issue description body.
    pub description: Option<String>,
    /// Status name.
    pub status: Option<String>,
    /// Priority name.
    pub priority: Option<String>,
    /// Assignee display name.
    pub assignee: Option<String>,
    /// Issue type name.
    #[serde(rename = "type")]
    pub issue_type: Option<String>,
    /// Expanded comments.
    pub comments: Vec<IssueComment>,
    /// Expanded attachments.
    pub attachments: Vec<IssueAttachment>,
}

/// One comment on an issue.
#[derive(Debug, Serialize)]
pub struct IssueComment {
    /// Comment id.
    pub id: Option<String>,
    /// Author display name.
    pub author: Option<String>,
    /// Comment body.
    pub body: Option<String>,
    /// Creation timestamp as reported by the site.
    pub created: Option<String>,
}

/// One attachment on an issue.
#[derive(Debug, Serialize)]
pub struct IssueAttachment {
    /// Attachment id.
    pub id: Option<String>,
    /// File name.
    pub filename: Option<String>,
    /// Size in bytes.
    pub size: Option<u64>,
    /// Creation timestamp.
    pub created: Option<String>,
    /// MIME type.
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
    /// Download URL.
    pub content: Option<String>,
}

/// Compact issue view returned by search.
#[derive(Debug, Serialize)]
pub struct IssueSummary {
    /// Issue key.
    pub key: String,
    /// Issue summary line.
    pub summary: Option<String>,
    /// Status name.
    pub status: Option<String>,
    /// Priority name.
    pub priority: Option<String>,
    /// Assignee display name.
    pub assignee: Option<String>,
    /// Issue type name.
    #[serde(rename = "type")]
    pub issue_type: Option<String>,
}

/// Result of creating a comment.
#[derive(Debug, Serialize)]
pub struct CommentCreated {
    /// New comment id.
    pub id: Option<String>,
    /// Creation timestamp.
    pub created: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentCreatedResponse {
    id: Option<String>,
    created: Option<String>,
}

// ── Implementation ──────────────────────────────────────────────────────────

impl JiraClient {
    /// Builds a client for the given site configuration.
    pub fn new(config: &JiraConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            email: config.email.clone(),
            api_token: config.api_token.clone(),
        }
    }

    /// Fetches a full issue with comments and attachments in one call.
    pub async fn get_issue(&self, issue_key: &str) -> GatewayResult<IssueDetail> {
        let url = format!("{}/rest/api/2/issue/{issue_key}", self.base_url);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.email, Some(&self.api_token))
            .query(&[("fields", format!("{ISSUE_FIELDS},comment,attachment"))])
            .send()
            .await
            .map_err(|e| GatewayError::Backend(format!("Jira request error: {e}")))?;

        let issue: IssueResponse = decode(response).await?;
        Ok(project_detail(issue))
    }

    /// Searches issues by JQL, returning compact summaries.
    pub async fn search(&self, jql: &str, max_results: u64) -> GatewayResult<Vec<IssueSummary>> {
        let url = format!("{}/rest/api/2/search", self.base_url);
        let max_results = max_results.to_string();
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.email, Some(&self.api_token))
            .query(&[
                ("jql", jql),
                ("maxResults", max_results.as_str()),
                ("fields", ISSUE_FIELDS),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::Backend(format!("Jira request error: {e}")))?;

        let body: SearchResponse = decode(response).await?;
        Ok(body.issues.into_iter().map(project_summary).collect())
    }

    /// Adds a comment to an issue.
    pub async fn add_comment(&self, issue_key: &str, body: &str) -> GatewayResult<CommentCreated> {
        let url = format!("{}/rest/api/2/issue/{issue_key}/comment", self.base_url);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.email, Some(&self.api_token))
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await
            .map_err(|e| GatewayError::Backend(format!("Jira request error: {e}")))?;

        let created: CommentCreatedResponse = decode(response).await?;
        Ok(CommentCreated {
            id: created.id,
            created: created.created,
        })
    }
}

/// Decodes a Jira response, mapping error statuses to `Backend` with the
/// site's own error messages where present.
async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> GatewayResult<T> {
    let status = response.status();
    if !status.is_success() {
        let detail: ErrorResponse = response.json().await.unwrap_or_default();
        let message = if detail.error_messages.is_empty() {
            format!("HTTP {status}")
        } else {
            detail.error_messages.join("; ")
        };
        return Err(GatewayError::Backend(message));
    }
    response
        .json()
        .await
        .map_err(|e| GatewayError::Backend(format!("Jira response parse error: {e}")))
}

fn project_detail(issue: IssueResponse) -> IssueDetail {
    let fields = issue.fields;
    IssueDetail {
        key: issue.key,
        summary: fields.summary,
        description: fields.description,
        status: fields.status.and_then(|s| s.name),
        priority: fields.priority.and_then(|p| p.name),
        assignee: fields.assignee.and_then(|a| a.display_name),
        issue_type: fields.issuetype.and_then(|t| t.name),
        comments: fields
            .comment
            .comments
            .into_iter()
            .map(|c| IssueComment {
                id: c.id,
                author: c.author.and_then(|a| a.display_name),
                body: c.body,
                created: c.created,
            })
            .collect(),
        attachments: fields
            .attachment
            .into_iter()
            .map(|a| IssueAttachment {
                id: a.id,
                filename: a.filename,
                size: a.size,
                created: a.created,
                mime_type: a.mime_type,
                content: a.content,
            })
            .collect(),
    }
}

fn project_summary(issue: IssueResponse) -> IssueSummary {
    let fields = issue.fields;
    IssueSummary {
        key: issue.key,
        summary: fields.summary,
        status: fields.status.and_then(|s| s.name),
        priority: fields.priority.and_then(|p| p.name),
        assignee: fields.assignee.and_then(|a| a.display_name),
        issue_type: fields.issuetype.and_then(|t| t.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_subfields_project_to_null() {
        let issue: IssueResponse = serde_json::from_value(serde_json::json!({
            "key": "PROJ-42",
            "fields": {
                "summary": "No assignee here",
                "status": {"name": "Open"}
            }
        }))
        .unwrap();
        let detail = project_detail(issue);
        assert_eq!(detail.key, "PROJ-42");
        assert!(detail.assignee.is_none());
        assert!(detail.priority.is_none());
        assert!(detail.comments.is_empty());

        let json = serde_json::to_value(&detail).unwrap();
        assert!(json["assignee"].is_null());
        assert_eq!(json["type"], serde_json::Value::Null);
    }

    #[test]
    fn summary_projection_renames_issue_type() {
        let issue: IssueResponse = serde_json::from_value(serde_json::json!({
            "key": "PROJ-1",
            "fields": {"issuetype": {"name": "Bug"}}
        }))
        .unwrap();
        let json = serde_json::to_value(project_summary(issue)).unwrap();
        assert_eq!(json["type"], "Bug");
    }
}
