//! Explicit auth session: owns the token file and refreshes on demand.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::token::StoredToken;
use crate::error::AuthError;

/// Anything that can hand out a bearer token for the mail API.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A currently valid access token, refreshing first if needed.
    async fn access_token(&self) -> Result<SecretString, AuthError>;
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// OAuth session backed by a token file.
///
/// The file is read lazily on first use and rewritten after every refresh.
/// The initial consent flow is not handled here; a missing file is an
/// [`AuthError::TokenMissing`].
pub struct AuthSession {
    path: PathBuf,
    http: reqwest::Client,
    token: Mutex<Option<StoredToken>>,
}

impl AuthSession {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_client(path, reqwest::Client::new())
    }

    pub fn with_client(path: impl Into<PathBuf>, http: reqwest::Client) -> Self {
        Self {
            path: path.into(),
            http,
            token: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the cached (or on-disk) token is usable right now.
    pub async fn is_valid(&self) -> Result<bool, AuthError> {
        let mut guard = self.token.lock().await;
        let token = self.loaded(&mut guard).await?;
        Ok(token.valid(Utc::now()))
    }

    /// Whether the cached (or on-disk) token has passed its expiry.
    pub async fn is_expired(&self) -> Result<bool, AuthError> {
        let mut guard = self.token.lock().await;
        let token = self.loaded(&mut guard).await?;
        Ok(token.expired(Utc::now()))
    }

    /// Exchange the refresh token for a new access token and persist it.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let mut guard = self.token.lock().await;
        let token = self.loaded(&mut guard).await?;
        self.refresh_locked(token).await
    }

    async fn loaded<'a>(
        &self,
        slot: &'a mut Option<StoredToken>,
    ) -> Result<&'a mut StoredToken, AuthError> {
        if slot.is_none() {
            debug!(path = %self.path.display(), "Loading OAuth token file");
            *slot = Some(StoredToken::load(&self.path).await?);
        }
        slot.as_mut().ok_or(AuthError::TokenMissing {
            path: self.path.display().to_string(),
        })
    }

    async fn refresh_locked(&self, token: &mut StoredToken) -> Result<(), AuthError> {
        let Some(refresh_token) = token.refresh_token.as_ref() else {
            return Err(AuthError::NotRefreshable);
        };

        let response = self
            .http
            .post(&token.token_uri)
            .form(&[
                ("client_id", token.client_id.as_str()),
                ("client_secret", token.client_secret.expose_secret()),
                ("refresh_token", refresh_token.expose_secret()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::RefreshFailed {
                reason: format!("token endpoint returned HTTP {}: {}", status.as_u16(), body),
            });
        }

        let refreshed: RefreshResponse =
            response.json().await.map_err(|e| AuthError::RefreshFailed {
                reason: format!("malformed token response: {e}"),
            })?;

        token.apply_refresh(
            refreshed.access_token,
            refreshed.expires_in,
            refreshed.refresh_token,
            Utc::now(),
        );
        token.save(&self.path).await?;

        info!(expiry = ?token.expiry, "OAuth token refreshed");
        Ok(())
    }
}

#[async_trait]
impl TokenProvider for AuthSession {
    async fn access_token(&self) -> Result<SecretString, AuthError> {
        let mut guard = self.token.lock().await;
        let token = self.loaded(&mut guard).await?;

        if !token.valid(Utc::now()) {
            if !token.can_refresh() {
                return Err(AuthError::NotRefreshable);
            }
            self.refresh_locked(token).await?;
        }

        token
            .access_token
            .as_ref()
            .map(|t| SecretString::from(t.expose_secret().to_string()))
            .ok_or(AuthError::NotRefreshable)
    }
}

/// Fixed token, for tests and for callers that manage tokens themselves.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<SecretString, AuthError> {
        Ok(SecretString::from(self.0.clone()))
    }
}
