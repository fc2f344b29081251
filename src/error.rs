//! Error types for the sender inbox service.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Gmail error: {0}")]
    Gmail(#[from] GmailError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// OAuth token errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token file not found at {path}. Complete the OAuth consent flow first.")]
    TokenMissing { path: String },

    #[error("Token file {path} is unreadable: {reason}")]
    TokenUnreadable { path: String, reason: String },

    #[error("Stored token is invalid and has no refresh token")]
    NotRefreshable,

    #[error("Token refresh failed: {reason}")]
    RefreshFailed { reason: String },

    #[error("Failed to persist token to {path}: {reason}")]
    PersistFailed { path: String, reason: String },
}

/// Gmail API (upstream) errors. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum GmailError {
    #[error("Gmail request {operation} failed: {reason}")]
    Transport { operation: String, reason: String },

    #[error("Gmail {operation} returned HTTP {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from Gmail {operation}: {reason}")]
    InvalidResponse { operation: String, reason: String },

    #[error("Gmail authentication failed: {0}")]
    Auth(#[from] AuthError),
}

impl GmailError {
    /// The upstream HTTP status, if the provider answered at all.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Headless rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Rendering did not finish within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("WebDriver {step} failed: {reason}")]
    WebDriver { step: String, reason: String },
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
