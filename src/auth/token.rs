//! File-persisted OAuth token, compatible with the authorized-user JSON that
//! Google's client libraries write (`token.json`).

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::AuthError;

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens expiring within this margin are treated as already expired.
const EXPIRY_SKEW_SECONDS: i64 = 60;

/// On-disk layout. Unknown keys are carried through untouched.
#[derive(Serialize, Deserialize)]
struct TokenFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    token_uri: String,
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
    #[serde(default)]
    scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiry: Option<DateTime<Utc>>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// An authorized-user OAuth token.
pub struct StoredToken {
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub scopes: Vec<String>,
    pub expiry: Option<DateTime<Utc>>,
    extra: serde_json::Map<String, serde_json::Value>,
}

impl std::fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredToken")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl StoredToken {
    /// Parse the JSON contents of a token file.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let file: TokenFile = serde_json::from_str(raw)?;
        Ok(Self {
            access_token: file.token.filter(|t| !t.is_empty()).map(SecretString::from),
            refresh_token: file
                .refresh_token
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
            token_uri: file.token_uri,
            client_id: file.client_id,
            client_secret: SecretString::from(file.client_secret),
            scopes: file.scopes,
            expiry: file.expiry,
            extra: file.extra,
        })
    }

    /// Serialize back to the on-disk JSON layout.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let file = TokenFile {
            token: self
                .access_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            refresh_token: self
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            token_uri: self.token_uri.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.expose_secret().to_string(),
            scopes: self.scopes.clone(),
            expiry: self.expiry,
            extra: self.extra.clone(),
        };
        serde_json::to_string_pretty(&file)
    }

    /// Read a token file from disk.
    pub async fn load(path: &Path) -> Result<Self, AuthError> {
        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::TokenMissing {
                    path: path.display().to_string(),
                });
            }
            Err(e) => {
                return Err(AuthError::TokenUnreadable {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        Self::from_json(&raw).map_err(|e| AuthError::TokenUnreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Write the token file, replacing any previous contents.
    pub async fn save(&self, path: &Path) -> Result<(), AuthError> {
        let persist_err = |reason: String| AuthError::PersistFailed {
            path: path.display().to_string(),
            reason,
        };
        let json = self.to_json().map_err(|e| persist_err(e.to_string()))?;
        fs::write(path, json)
            .await
            .map_err(|e| persist_err(e.to_string()))
    }

    /// True when an expiry is known and has passed (with skew).
    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now + Duration::seconds(EXPIRY_SKEW_SECONDS) >= expiry,
            None => false,
        }
    }

    /// True when an access token is present and not expired.
    pub fn valid(&self, now: DateTime<Utc>) -> bool {
        self.access_token.is_some() && !self.expired(now)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Store a freshly issued access token.
    pub fn apply_refresh(
        &mut self,
        access_token: String,
        expires_in_secs: Option<i64>,
        refresh_token: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.access_token = Some(SecretString::from(access_token));
        self.expiry = expires_in_secs.map(|secs| now + Duration::seconds(secs));
        if let Some(rt) = refresh_token.filter(|t| !t.is_empty()) {
            self.refresh_token = Some(SecretString::from(rt));
        }
    }
}
