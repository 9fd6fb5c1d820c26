//! Slack provider adapter.
//!
//! Exposes messaging, channel management, reaction, and file upload
//! operations as gateway tools. A bot token read from configuration is the
//! only credential; invocations without one short-circuit to a
//! `missing_config` failure before any call is attempted.

/// Slack Web API client.
pub mod client;
/// Environment-backed configuration.
pub mod config;
/// Tool implementations and registration.
pub mod tools;

pub use client::SlackClient;
pub use config::SlackConfig;
pub use tools::register_tools;
