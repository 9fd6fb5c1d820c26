//! Integration tests for the Gmail adapter against a mocked API, driving
//! session resolution from a real on-disk token store.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::json;
use std::path::PathBuf;
use switchboard_core::{ToolOutcome, ToolRegistry};
use switchboard_gmail::{register_tools, GmailConfig};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_token(dir: &TempDir, expiry: &str, token_uri: &str) -> PathBuf {
    let token_path = dir.path().join("token.json");
    std::fs::write(
        &token_path,
        json!({
            "token": "test-token",
            "refresh_token": "refresh-abc",
            "token_uri": token_uri,
            "client_id": "client-id",
            "client_secret": "client-secret",
            "scopes": ["https://www.googleapis.com/auth/gmail.readonly"],
            "expiry": expiry
        })
        .to_string(),
    )
    .unwrap();
    token_path
}

fn registry_for(server: &MockServer, token_path: PathBuf) -> ToolRegistry {
    let config = GmailConfig {
        credentials_path: None,
        token_path,
        api_base: server.uri(),
    };
    let mut registry = ToolRegistry::new();
    register_tools(&mut registry, config).unwrap();
    registry
}

fn expect_success(outcome: ToolOutcome) -> serde_json::Value {
    match outcome {
        ToolOutcome::Success { data } => data,
        ToolOutcome::Failure { message, .. } => panic!("expected success: {message}"),
    }
}

#[tokio::test]
async fn missing_credential_sources_fail_without_network() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    // No token file and no client-secret file configured.
    let registry = registry_for(&server, dir.path().join("absent.json"));

    for (tool, arguments) in [
        ("list_emails", json!({})),
        ("get_email", json!({"id": "m1"})),
        ("list_gmail_labels", json!({})),
        ("search_gmail", json!({"q": "is:unread"})),
        ("get_gmail_thread", json!({"thread_id": "t1"})),
    ] {
        match registry.dispatch(tool, arguments).await {
            ToolOutcome::Failure { kind, message } => {
                assert_eq!(kind, "missing_config", "tool {tool}");
                assert!(message.contains("GMAIL_CREDENTIALS_JSON"));
            }
            ToolOutcome::Success { .. } => panic!("expected failure for {tool}"),
        }
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_emails_uses_fixed_page_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/messages"))
        .and(query_param("q", "from:ci@example.com"))
        .and(query_param("maxResults", "5"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                {"id": "m1", "threadId": "t1"},
                {"id": "m2", "threadId": "t1"}
            ],
            "resultSizeEstimate": 2
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let token_path = write_token(&dir, "2099-01-01T00:00:00Z", "https://unused.example/token");
    let registry = registry_for(&server, token_path);

    let data = expect_success(
        registry
            .dispatch("list_emails", json!({"q": "from:ci@example.com"}))
            .await,
    );
    let messages = data["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["id"], "m1");
    assert_eq!(messages[0]["threadId"], "t1");
}

#[tokio::test]
async fn search_assembles_summaries_from_metadata_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/messages"))
        .and(query_param("maxResults", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{"id": "m1", "threadId": "t1"}, {"id": "m2", "threadId": "t2"}]
        })))
        .mount(&server)
        .await;
    for (id, subject) in [("m1", "Build failed"), ("m2", "Build fixed")] {
        Mock::given(method("GET"))
            .and(path(format!("/users/me/messages/{id}")))
            .and(query_param("format", "metadata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "threadId": "t1",
                "snippet": "snippet text",
                "payload": {
                    "mimeType": "text/plain",
                    "headers": [
                        {"name": "Subject", "value": subject},
                        {"name": "From", "value": "ci@example.com"},
                        {"name": "Date", "value": "Mon, 1 Apr 2024 10:00:00 +0000"}
                    ]
                }
            })))
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let token_path = write_token(&dir, "2099-01-01T00:00:00Z", "https://unused.example/token");
    let registry = registry_for(&server, token_path);

    let data = expect_success(
        registry
            .dispatch("search_gmail", json!({"q": "subject:build", "max_results": 2}))
            .await,
    );
    let messages = data["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["subject"], "Build failed");
    assert_eq!(messages[0]["from"], "ci@example.com");
    assert_eq!(messages[0]["threadId"], "t1");
    assert_eq!(messages[1]["subject"], "Build fixed");

    // One list call plus one metadata fetch per message.
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn thread_body_extraction_honors_preference() {
    let server = MockServer::start().await;
    let plain = URL_SAFE_NO_PAD.encode("plain text body");
    let html = URL_SAFE_NO_PAD.encode("<p>html body</p>");
    Mock::given(method("GET"))
        .and(path("/users/me/threads/t9"))
        .and(query_param("format", "full"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t9",
            "messages": [{
                "id": "m9",
                "snippet": "…",
                "payload": {
                    "mimeType": "multipart/alternative",
                    "headers": [
                        {"name": "Subject", "value": "Release"},
                        {"name": "From", "value": "a@example.com"},
                        {"name": "To", "value": "b@example.com"},
                        {"name": "Date", "value": "Tue, 2 Apr 2024 09:00:00 +0000"}
                    ],
                    "parts": [
                        {"mimeType": "text/plain", "body": {"data": plain}},
                        {"mimeType": "text/html", "body": {"data": html}}
                    ]
                }
            }]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let token_path = write_token(&dir, "2099-01-01T00:00:00Z", "https://unused.example/token");
    let registry = registry_for(&server, token_path);

    let data = expect_success(
        registry
            .dispatch("get_gmail_thread", json!({"thread_id": "t9"}))
            .await,
    );
    assert_eq!(data["id"], "t9");
    assert_eq!(data["messages"][0]["subject"], "Release");
    assert_eq!(data["messages"][0]["to"], "b@example.com");
    assert_eq!(data["messages"][0]["body"], "plain text body");

    let data = expect_success(
        registry
            .dispatch(
                "get_gmail_thread",
                json!({"thread_id": "t9", "prefer_body": "html"}),
            )
            .await,
    );
    assert_eq!(data["messages"][0]["body"], "<p>html body</p>");
}

#[tokio::test]
async fn malformed_body_data_yields_null_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/threads/t5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t5",
            "messages": [{
                "id": "m5",
                "payload": {
                    "mimeType": "text/plain",
                    "body": {"data": "%%%broken%%%"},
                    "headers": []
                }
            }]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let token_path = write_token(&dir, "2099-01-01T00:00:00Z", "https://unused.example/token");
    let registry = registry_for(&server, token_path);

    let data = expect_success(
        registry
            .dispatch("get_gmail_thread", json!({"thread_id": "t5"}))
            .await,
    );
    assert!(data["messages"][0]["body"].is_null());
}

#[tokio::test]
async fn expired_token_is_refreshed_and_store_rewritten() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me/labels"))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "labels": [{"id": "INBOX", "name": "INBOX", "type": "system"}]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let token_path = write_token(
        &dir,
        "2000-01-01T00:00:00Z",
        &format!("{}/oauth/token", server.uri()),
    );
    let registry = registry_for(&server, token_path.clone());

    let data = expect_success(registry.dispatch("list_gmail_labels", json!({})).await);
    assert_eq!(data["labels"][0]["id"], "INBOX");

    let rewritten = std::fs::read_to_string(&token_path).unwrap();
    assert!(rewritten.contains("fresh-token"));
    assert!(rewritten.contains("refresh-abc"));
}

#[tokio::test]
async fn list_labels_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/labels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "labels": [
                {"id": "INBOX", "name": "INBOX"},
                {"id": "Label_7", "name": "deploys"}
            ]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let token_path = write_token(&dir, "2099-01-01T00:00:00Z", "https://unused.example/token");
    let registry = registry_for(&server, token_path);

    let first = expect_success(registry.dispatch("list_gmail_labels", json!({})).await);
    let second = expect_success(registry.dispatch("list_gmail_labels", json!({})).await);
    assert_eq!(first, second);
    assert_eq!(first["labels"][1]["name"], "deploys");
}

#[tokio::test]
async fn get_email_passes_vendor_object_through() {
    let server = MockServer::start().await;
    let full = json!({
        "id": "m1",
        "threadId": "t1",
        "labelIds": ["INBOX"],
        "snippet": "hello",
        "payload": {
            "mimeType": "text/plain",
            "headers": [{"name": "Subject", "value": "Hi"}],
            "body": {"size": 5, "data": "aGVsbG8"}
        },
        "sizeEstimate": 512
    });
    Mock::given(method("GET"))
        .and(path("/users/me/messages/m1"))
        .and(query_param("format", "full"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full.clone()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let token_path = write_token(&dir, "2099-01-01T00:00:00Z", "https://unused.example/token");
    let registry = registry_for(&server, token_path);

    let data = expect_success(registry.dispatch("get_email", json!({"id": "m1"})).await);
    // Opaque pass-through: the vendor shape survives untouched.
    assert_eq!(data, full);
}
