use crate::auth::StoredToken;
use crate::GMAIL_SCOPE;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::path::Path;
use switchboard_core::{GatewayError, GatewayResult};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::info;

const CONSENT_PAGE: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
<html><body>Authorization received. You may close this window.</body></html>";

/// The vendor client-secret file for an installed application.
#[derive(Debug, Deserialize)]
struct ClientSecrets {
    installed: InstalledApp,
}

#[derive(Debug, Deserialize)]
struct InstalledApp {
    client_id: String,
    client_secret: String,
    #[serde(default = "default_auth_uri")]
    auth_uri: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

/// Runs the interactive installed-app consent flow.
///
/// Binds a loopback listener on an ephemeral port, prints the consent URL
/// for the operator, waits for the single redirect carrying the
/// authorization code, and exchanges it for a token. Blocks until the
/// operator completes consent in a browser.
pub async fn run_consent_flow(credentials_path: &Path) -> GatewayResult<StoredToken> {
    let raw = tokio::fs::read_to_string(credentials_path).await.map_err(|e| {
        GatewayError::MissingConfig(format!(
            "Cannot read client secrets {}: {e}",
            credentials_path.display()
        ))
    })?;
    let secrets: ClientSecrets = serde_json::from_str(&raw).map_err(|e| {
        GatewayError::MissingConfig(format!(
            "Malformed client secrets {}: {e}",
            credentials_path.display()
        ))
    })?;
    let app = secrets.installed;

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| GatewayError::LocalIo(format!("Cannot bind consent listener: {e}")))?;
    let port = listener
        .local_addr()
        .map_err(|e| GatewayError::LocalIo(format!("Cannot read listener address: {e}")))?
        .port();
    let redirect_uri = format!("http://127.0.0.1:{port}");

    let consent_url = format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&access_type=offline&prompt=consent",
        app.auth_uri, app.client_id, redirect_uri, GMAIL_SCOPE
    );
    info!(url = %consent_url, "Waiting for operator consent");
    println!("Open this URL in your browser to authorize Gmail access:\n\n{consent_url}\n");

    let code = wait_for_code(&listener).await?;

    let params = [
        ("code", code),
        ("client_id", app.client_id.clone()),
        ("client_secret", app.client_secret.clone()),
        ("redirect_uri", redirect_uri),
        ("grant_type", "authorization_code".to_string()),
    ];
    let response = reqwest::Client::new()
        .post(&app.token_uri)
        .form(&params)
        .send()
        .await
        .map_err(|e| GatewayError::Backend(format!("Code exchange error: {e}")))?;
    if !response.status().is_success() {
        return Err(GatewayError::Backend(format!(
            "Code exchange failed: HTTP {}",
            response.status()
        )));
    }
    let body: TokenResponse = response
        .json()
        .await
        .map_err(|e| GatewayError::Backend(format!("Code exchange parse error: {e}")))?;

    info!("Gmail authorization complete");
    Ok(StoredToken {
        token: Some(body.access_token),
        refresh_token: body.refresh_token,
        token_uri: Some(app.token_uri),
        client_id: Some(app.client_id),
        client_secret: Some(app.client_secret),
        scopes: vec![GMAIL_SCOPE.to_string()],
        expiry: body
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs)),
    })
}

/// Accepts one redirect request and pulls the `code` query parameter out of
/// its request line.
async fn wait_for_code(listener: &TcpListener) -> GatewayResult<String> {
    let (mut stream, _) = listener
        .accept()
        .await
        .map_err(|e| GatewayError::LocalIo(format!("Consent listener error: {e}")))?;

    let mut buf = vec![0u8; 4096];
    let read = stream
        .read(&mut buf)
        .await
        .map_err(|e| GatewayError::LocalIo(format!("Consent read error: {e}")))?;
    let request = String::from_utf8_lossy(&buf[..read]).into_owned();

    let code = request
        .lines()
        .next()
        .and_then(auth_code_from_request_line)
        .ok_or_else(|| GatewayError::Backend("Redirect carried no authorization code".into()))?;

    let _ = stream.write_all(CONSENT_PAGE.as_bytes()).await;
    Ok(code)
}

/// Parses `GET /?code=...&scope=... HTTP/1.1` into the authorization code.
fn auth_code_from_request_line(line: &str) -> Option<String> {
    let target = line.split_whitespace().nth(1)?;
    let url = reqwest::Url::parse(&format!("http://127.0.0.1{target}")).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
}
