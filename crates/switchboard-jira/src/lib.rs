//! Jira provider adapter.
//!
//! Exposes `get_issue`, `search_issues`, and `add_jira_comment` as gateway
//! tools. Credentials are read from process configuration on every
//! invocation; nothing is cached or refreshed.

/// Jira REST client and response projections.
pub mod client;
/// Environment-backed configuration.
pub mod config;
/// Tool implementations and registration.
pub mod tools;

pub use client::JiraClient;
pub use config::JiraConfig;
pub use tools::register_tools;
