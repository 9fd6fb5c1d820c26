use std::env;
use std::path::PathBuf;

const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";
const DEFAULT_TOKEN_PATH: &str = "token.json";

/// Settings for the Gmail provider.
///
/// Unlike the other providers, a config always exists; what may be missing
/// is a way to obtain a credential, which surfaces as `missing_config` at
/// session resolution time.
#[derive(Debug, Clone)]
pub struct GmailConfig {
    /// Path to the OAuth client-secret file, if configured.
    pub credentials_path: Option<PathBuf>,
    /// Path of the persisted token store.
    pub token_path: PathBuf,
    /// API base URL; overridable for tests.
    pub api_base: String,
}

impl GmailConfig {
    /// Reads `GMAIL_CREDENTIALS_JSON` and `GMAIL_TOKEN_JSON` (default
    /// `token.json`).
    pub fn from_env() -> Self {
        let credentials_path = env::var("GMAIL_CREDENTIALS_JSON")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let token_path = env::var("GMAIL_TOKEN_JSON")
            .ok()
            .filter(|v| !v.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH), PathBuf::from);
        Self {
            credentials_path,
            token_path,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Config with a given token path and the production API base.
    pub fn with_token_path(token_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: None,
            token_path: token_path.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}
