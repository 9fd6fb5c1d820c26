use std::env;

/// Connection settings for one Jira site.
///
/// Authentication is HTTP basic: account email + API token.
#[derive(Debug, Clone)]
pub struct JiraConfig {
    /// Site base URL, e.g. `https://example.atlassian.net`.
    pub base_url: String,
    /// Account email for basic auth.
    pub email: String,
    /// API token for basic auth.
    pub api_token: String,
}

impl JiraConfig {
    /// Reads `JIRA_BASE_URL`, `JIRA_EMAIL`, and `JIRA_API_TOKEN`.
    ///
    /// Returns `None` when any of the three is absent or empty; the
    /// provider's tools then answer every invocation with a
    /// `missing_config` failure instead of attempting a call.
    pub fn from_env() -> Option<Self> {
        let base_url = non_empty(env::var("JIRA_BASE_URL").ok()?)?;
        let email = non_empty(env::var("JIRA_EMAIL").ok()?)?;
        let api_token = non_empty(env::var("JIRA_API_TOKEN").ok()?)?;
        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            email,
            api_token,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = JiraConfig {
            base_url: "https://example.atlassian.net/".trim_end_matches('/').to_string(),
            email: "bot@example.com".into(),
            api_token: "tok".into(),
        };
        assert_eq!(config.base_url, "https://example.atlassian.net");
    }
}
