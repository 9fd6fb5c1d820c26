use crate::config::GmailConfig;
use crate::flow;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use switchboard_core::{GatewayError, GatewayResult};
use tracing::{debug, info};

/// Clock skew allowed before a token counts as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// The persisted credential blob, in the vendor's authorized-user shape.
///
/// The gateway rewrites this file on refresh but otherwise treats unknown
/// fields as opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    /// Current access token.
    pub token: Option<String>,
    /// Long-lived refresh token.
    pub refresh_token: Option<String>,
    /// Token endpoint used for refresh.
    pub token_uri: Option<String>,
    /// OAuth client id.
    pub client_id: Option<String>,
    /// OAuth client secret.
    pub client_secret: Option<String>,
    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Access-token expiry.
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// Whether the access token is expired (or will be within the margin).
    pub fn expired(&self) -> bool {
        match self.expiry {
            Some(expiry) => Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= expiry,
            None => false,
        }
    }
}

/// An authorized Gmail session: the bearer token plus its expiry.
#[derive(Debug, Clone)]
pub struct GmailSession {
    /// Bearer token for API calls.
    pub access_token: String,
    /// When the token stops being usable, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl GmailSession {
    /// Whether this cached session needs re-resolution.
    pub fn expired(&self) -> bool {
        match self.expires_at {
            Some(expiry) => Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= expiry,
            None => false,
        }
    }
}

/// Reads the token store, `None` when the file does not exist.
pub async fn load_token(config: &GmailConfig) -> GatewayResult<Option<StoredToken>> {
    match tokio::fs::read_to_string(&config.token_path).await {
        Ok(raw) => {
            let token: StoredToken = serde_json::from_str(&raw).map_err(|e| {
                GatewayError::LocalIo(format!(
                    "Unreadable token store {}: {e}",
                    config.token_path.display()
                ))
            })?;
            Ok(Some(token))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(GatewayError::LocalIo(format!(
            "Unreadable token store {}: {e}",
            config.token_path.display()
        ))),
    }
}

/// Persists the token store. Concurrent writers race; last one wins.
pub async fn save_token(config: &GmailConfig, token: &StoredToken) -> GatewayResult<()> {
    let raw = serde_json::to_string_pretty(token)?;
    tokio::fs::write(&config.token_path, raw)
        .await
        .map_err(|e| {
            GatewayError::LocalIo(format!(
                "Failed to write token store {}: {e}",
                config.token_path.display()
            ))
        })?;
    debug!(path = %config.token_path.display(), "Token store written");
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

/// Exchanges the refresh token for a fresh access token and rewrites the
/// store.
async fn refresh_token(config: &GmailConfig, stored: StoredToken) -> GatewayResult<StoredToken> {
    let token_uri = stored
        .token_uri
        .as_deref()
        .ok_or_else(|| GatewayError::MissingConfig("Token store has no token_uri".into()))?;
    let refresh = stored
        .refresh_token
        .as_deref()
        .ok_or_else(|| GatewayError::MissingConfig("Token store has no refresh_token".into()))?;

    let params = [
        ("client_id", stored.client_id.clone().unwrap_or_default()),
        ("client_secret", stored.client_secret.clone().unwrap_or_default()),
        ("refresh_token", refresh.to_string()),
        ("grant_type", "refresh_token".to_string()),
    ];
    let response = reqwest::Client::new()
        .post(token_uri)
        .form(&params)
        .send()
        .await
        .map_err(|e| GatewayError::Backend(format!("Token refresh error: {e}")))?;
    if !response.status().is_success() {
        return Err(GatewayError::Backend(format!(
            "Token refresh failed: HTTP {}",
            response.status()
        )));
    }
    let body: RefreshResponse = response
        .json()
        .await
        .map_err(|e| GatewayError::Backend(format!("Token refresh parse error: {e}")))?;

    let refreshed = StoredToken {
        token: Some(body.access_token),
        refresh_token: body.refresh_token.or(stored.refresh_token),
        token_uri: stored.token_uri,
        client_id: stored.client_id,
        client_secret: stored.client_secret,
        scopes: stored.scopes,
        expiry: body
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs)),
    };
    save_token(config, &refreshed).await?;
    info!("Gmail access token refreshed");
    Ok(refreshed)
}

/// Resolves an authorized session.
///
/// Order: persisted token store (refreshing if expired), then the
/// interactive consent flow when a client-secret file is configured,
/// otherwise `MissingConfig`.
pub async fn resolve_session(config: &GmailConfig) -> GatewayResult<GmailSession> {
    if let Some(stored) = load_token(config).await? {
        let stored = if stored.expired() {
            refresh_token(config, stored).await?
        } else {
            stored
        };
        let access_token = stored.token.ok_or_else(|| {
            GatewayError::MissingConfig("Token store has no access token".into())
        })?;
        return Ok(GmailSession {
            access_token,
            expires_at: stored.expiry,
        });
    }

    if let Some(credentials_path) = &config.credentials_path {
        info!(path = %credentials_path.display(), "No token store; starting consent flow");
        let stored = flow::run_consent_flow(credentials_path).await?;
        save_token(config, &stored).await?;
        let access_token = stored.token.clone().ok_or_else(|| {
            GatewayError::MissingConfig("Consent flow returned no access token".into())
        })?;
        return Ok(GmailSession {
            access_token,
            expires_at: stored.expiry,
        });
    }

    Err(GatewayError::MissingConfig(
        "Gmail credentials missing. Set GMAIL_CREDENTIALS_JSON or provide a token file".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expiry: Option<DateTime<Utc>>) -> StoredToken {
        StoredToken {
            token: Some("tok".into()),
            refresh_token: Some("ref".into()),
            token_uri: Some("https://oauth2.example/token".into()),
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            scopes: vec![crate::GMAIL_SCOPE.to_string()],
            expiry,
        }
    }

    #[test]
    fn expiry_margin_is_applied() {
        assert!(token(Some(Utc::now())).expired());
        assert!(token(Some(Utc::now() + Duration::seconds(30))).expired());
        assert!(!token(Some(Utc::now() + Duration::hours(1))).expired());
        assert!(!token(None).expired());
    }

    #[tokio::test]
    async fn missing_store_resolves_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let config = GmailConfig::with_token_path(dir.path().join("token.json"));
        assert!(load_token(&config).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let config = GmailConfig::with_token_path(dir.path().join("token.json"));
        let original = token(Some(Utc::now() + Duration::hours(1)));
        save_token(&config, &original).await.unwrap();
        let loaded = load_token(&config).await.unwrap().unwrap();
        assert_eq!(loaded.token.as_deref(), Some("tok"));
        assert_eq!(loaded.scopes, original.scopes);
    }

    #[tokio::test]
    async fn no_sources_is_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = GmailConfig::with_token_path(dir.path().join("token.json"));
        let err = resolve_session(&config).await.unwrap_err();
        assert_eq!(err.kind(), "missing_config");
    }
}
