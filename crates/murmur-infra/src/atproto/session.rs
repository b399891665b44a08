//! Authenticated PDS session.
//!
//! The access token is short-lived. `AuthSession` holds the current token
//! pair behind a `RwLock`: requests take a read lock to copy the access
//! token, and the periodic refresh swaps both tokens under the write lock.

use murmur_types::error::NetworkError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

/// Identifier and app password for the bot account.
pub struct LoginCredentials {
    pub identifier: String,
    pub password: SecretString,
}

#[derive(Serialize)]
struct CreateSessionInput<'a> {
    identifier: &'a str,
    password: &'a str,
}

/// Response body of `createSession` and `refreshSession`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionOutput {
    access_jwt: String,
    refresh_jwt: String,
    did: String,
    handle: String,
}

struct Tokens {
    access: SecretString,
    refresh: SecretString,
    did: String,
}

impl From<SessionOutput> for Tokens {
    fn from(out: SessionOutput) -> Self {
        Self {
            access: SecretString::from(out.access_jwt),
            refresh: SecretString::from(out.refresh_jwt),
            did: out.did,
        }
    }
}

/// Token pair for the bot account on its PDS.
pub struct AuthSession {
    http: reqwest::Client,
    host: String,
    tokens: RwLock<Tokens>,
}

impl AuthSession {
    /// Log in with `com.atproto.server.createSession`.
    pub async fn login(
        http: reqwest::Client,
        host: impl Into<String>,
        credentials: &LoginCredentials,
    ) -> Result<Self, NetworkError> {
        let host = host.into().trim_end_matches('/').to_string();
        let url = format!("{host}/xrpc/com.atproto.server.createSession");
        let body = CreateSessionInput {
            identifier: &credentials.identifier,
            password: credentials.password.expose_secret(),
        };

        let request = http.post(&url).json(&body);
        let out = session_call(request, "com.atproto.server.createSession").await?;
        info!(did = %out.did, handle = %out.handle, "authenticated with pds");

        Ok(Self {
            http,
            host,
            tokens: RwLock::new(out.into()),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Current access token.
    pub async fn current(&self) -> SecretString {
        let tokens = self.tokens.read().await;
        SecretString::from(tokens.access.expose_secret().to_string())
    }

    /// DID of the logged-in account.
    pub async fn did(&self) -> String {
        self.tokens.read().await.did.clone()
    }

    /// Exchange the refresh token for a new token pair.
    ///
    /// The write lock is held across the call, so requests issued during a
    /// refresh wait for the new access token.
    pub async fn refresh(&self) -> Result<(), NetworkError> {
        let mut tokens = self.tokens.write().await;
        let url = format!("{}/xrpc/com.atproto.server.refreshSession", self.host);
        let request = self
            .http
            .post(&url)
            .bearer_auth(tokens.refresh.expose_secret());

        let out = session_call(request, "com.atproto.server.refreshSession").await?;
        info!(handle = %out.handle, "refreshed pds session");
        *tokens = out.into();
        Ok(())
    }
}

async fn session_call(
    request: reqwest::RequestBuilder,
    method: &str,
) -> Result<SessionOutput, NetworkError> {
    let response = request
        .send()
        .await
        .map_err(|e| NetworkError::Request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(NetworkError::Unauthorized(format!(
            "{method} returned status {}: {body}",
            status.as_u16()
        )));
    }

    response
        .json()
        .await
        .map_err(|e| NetworkError::Deserialization(e.to_string()))
}
