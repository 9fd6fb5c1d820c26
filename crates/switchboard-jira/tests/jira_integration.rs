//! Integration tests for the Jira adapter against a mocked site.

use serde_json::json;
use switchboard_core::{ToolOutcome, ToolRegistry};
use switchboard_jira::{register_tools, JiraConfig};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_config(server: &MockServer) -> JiraConfig {
    JiraConfig {
        base_url: server.uri(),
        email: "bot@example.com".to_string(),
        api_token: "secret-token".to_string(),
    }
}

fn registry_with(config: Option<JiraConfig>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_tools(&mut registry, config).unwrap();
    registry
}

#[tokio::test]
async fn get_issue_with_missing_assignee_yields_null() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/PROJ-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": "PROJ-42",
            "fields": {
                "summary": "Fix the widget",
                "description": "It is broken",
                "status": {"name": "In Progress"},
                "priority": {"name": "High"},
                "issuetype": {"name": "Bug"},
                "comment": {"comments": [
                    {"id": "100", "author": {"displayName": "Sam"}, "body": "On it", "created": "2024-03-01T10:00:00.000+0000"}
                ]},
                "attachment": [
                    {"id": "200", "filename": "trace.log", "size": 2048,
                     "created": "2024-03-01T11:00:00.000+0000",
                     "mimeType": "text/plain", "content": "https://example/attach/200"}
                ]
            }
        })))
        .mount(&server)
        .await;

    let registry = registry_with(Some(mock_config(&server)));
    let outcome = registry
        .dispatch("get_issue", json!({"issue_key": "PROJ-42"}))
        .await;

    match outcome {
        ToolOutcome::Success { data } => {
            assert_eq!(data["key"], "PROJ-42");
            assert_eq!(data["status"], "In Progress");
            assert!(data["assignee"].is_null());
            assert_eq!(data["comments"][0]["author"], "Sam");
            assert_eq!(data["attachments"][0]["mimeType"], "text/plain");
        }
        ToolOutcome::Failure { message, .. } => panic!("expected success: {message}"),
    }
}

#[tokio::test]
async fn search_with_empty_jql_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    let registry = registry_with(Some(mock_config(&server)));

    for arguments in [json!({}), json!({"jql": ""}), json!({"jql": "", "max_results": 500})] {
        let outcome = registry.dispatch("search_issues", arguments).await;
        match outcome {
            ToolOutcome::Failure { kind, message } => {
                assert_eq!(kind, "invalid_argument");
                assert!(message.contains("jql"));
            }
            ToolOutcome::Success { .. } => panic!("expected failure"),
        }
    }

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn search_returns_compact_summaries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/2/search"))
        .and(query_param("jql", "project = PROJ"))
        .and(query_param("maxResults", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issues": [
                {"key": "PROJ-1", "fields": {"summary": "First", "status": {"name": "Open"},
                 "assignee": {"displayName": "Jo"}, "issuetype": {"name": "Task"}}},
                {"key": "PROJ-2", "fields": {"summary": "Second"}}
            ]
        })))
        .mount(&server)
        .await;

    let registry = registry_with(Some(mock_config(&server)));
    let outcome = registry
        .dispatch("search_issues", json!({"jql": "project = PROJ", "max_results": 2}))
        .await;

    match outcome {
        ToolOutcome::Success { data } => {
            let issues = data.as_array().unwrap();
            assert_eq!(issues.len(), 2);
            assert_eq!(issues[0]["type"], "Task");
            assert!(issues[1]["assignee"].is_null());
        }
        ToolOutcome::Failure { message, .. } => panic!("expected success: {message}"),
    }
}

#[tokio::test]
async fn add_comment_returns_id_and_created() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/PROJ-7/comment"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "10023",
            "created": "2024-05-02T08:30:00.000+0000"
        })))
        .mount(&server)
        .await;

    let registry = registry_with(Some(mock_config(&server)));
    let outcome = registry
        .dispatch(
            "add_jira_comment",
            json!({"issue_key": "PROJ-7", "body": "Deployed to staging"}),
        )
        .await;

    match outcome {
        ToolOutcome::Success { data } => {
            assert_eq!(data["id"], "10023");
            assert_eq!(data["created"], "2024-05-02T08:30:00.000+0000");
        }
        ToolOutcome::Failure { message, .. } => panic!("expected success: {message}"),
    }
}

#[tokio::test]
async fn backend_error_messages_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/NOPE-1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errorMessages": ["Issue does not exist or you do not have permission to see it."]
        })))
        .mount(&server)
        .await;

    let registry = registry_with(Some(mock_config(&server)));
    let outcome = registry
        .dispatch("get_issue", json!({"issue_key": "NOPE-1"}))
        .await;

    match outcome {
        ToolOutcome::Failure { kind, message } => {
            assert_eq!(kind, "backend");
            assert!(message.contains("Issue does not exist"));
        }
        ToolOutcome::Success { .. } => panic!("expected failure"),
    }
}

#[tokio::test]
async fn unconfigured_provider_fails_without_network() {
    let registry = registry_with(None);

    for (tool, arguments) in [
        ("get_issue", json!({"issue_key": "ANY-1"})),
        ("search_issues", json!({"jql": "project = ANY"})),
        ("add_jira_comment", json!({"issue_key": "ANY-1", "body": "hi"})),
    ] {
        let outcome = registry.dispatch(tool, arguments).await;
        match outcome {
            ToolOutcome::Failure { kind, message } => {
                assert_eq!(kind, "missing_config", "tool {tool}");
                assert!(message.contains("JIRA_BASE_URL"));
            }
            ToolOutcome::Success { .. } => panic!("expected failure for {tool}"),
        }
    }
}
