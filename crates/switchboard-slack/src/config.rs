use std::env;

const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Connection settings for one Slack workspace.
#[derive(Debug, Clone)]
pub struct SlackConfig {
    /// Bot User OAuth token (`xoxb-...`).
    pub bot_token: String,
    /// Web API base URL; overridable for tests.
    pub api_base: String,
}

impl SlackConfig {
    /// Builds a config with the production API base.
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Reads `SLACK_BOT_TOKEN`; `None` when absent or empty.
    pub fn from_env() -> Option<Self> {
        match env::var("SLACK_BOT_TOKEN") {
            Ok(token) if !token.is_empty() => Some(Self::new(token)),
            _ => None,
        }
    }
}
