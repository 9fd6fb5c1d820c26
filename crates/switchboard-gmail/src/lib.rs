//! Gmail provider adapter.
//!
//! Exposes read-only mailbox operations as gateway tools. Credentials come
//! from a persisted OAuth token store, minted once through an interactive
//! consent flow and refreshed automatically when expired; the authorized
//! session is cached for the life of the process.

/// Token store, session resolution, and refresh.
pub mod auth;
/// Gmail REST client and wire types.
pub mod client;
/// Environment-backed configuration.
pub mod config;
/// Interactive installed-app consent flow.
pub mod flow;
/// MIME part tree walking and body decoding.
pub mod mime;
/// Tool implementations and registration.
pub mod tools;

pub use client::GmailClient;
pub use config::GmailConfig;
pub use tools::register_tools;

/// The only scope the gateway ever requests.
pub const GMAIL_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";
