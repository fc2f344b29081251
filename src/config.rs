//! Configuration types, built from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Number of recent messages scanned when building the sender index.
pub const DEFAULT_SCAN_WINDOW: u32 = 50;

/// Number of messages fetched per sender.
pub const DEFAULT_PER_SENDER: u32 = 5;

pub const DEFAULT_GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let bind = std::env::var("SENDER_INBOX_BIND").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("SENDER_INBOX_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);
        Self { bind, port }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                key: "SENDER_INBOX_BIND".to_string(),
                message: format!("{e}"),
            })
    }
}

/// Gmail API access configuration.
#[derive(Debug, Clone)]
pub struct GmailConfig {
    /// Path of the authorized-user token file.
    pub token_path: PathBuf,
    pub api_base: String,
    pub user_id: String,
}

impl GmailConfig {
    pub fn from_env() -> Self {
        let token_path = std::env::var("GMAIL_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("token.json"));
        let api_base = std::env::var("GMAIL_API_BASE")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_GMAIL_API_BASE.to_string());
        let user_id = std::env::var("GMAIL_USER_ID").unwrap_or_else(|_| "me".to_string());

        Self {
            token_path,
            api_base,
            user_id,
        }
    }
}

/// Limits applied by the inbox service.
#[derive(Debug, Clone)]
pub struct InboxConfig {
    /// How many recent messages the sender index scans.
    pub scan_window: u32,
    /// How many messages are returned per sender.
    pub per_sender: u32,
    /// Maximum in-flight detail fetches while building the index.
    pub fetch_concurrency: usize,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            scan_window: DEFAULT_SCAN_WINDOW,
            per_sender: DEFAULT_PER_SENDER,
            fetch_concurrency: 4,
        }
    }
}

impl InboxConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            scan_window: env_parse("SENDER_INBOX_SCAN_WINDOW").unwrap_or(defaults.scan_window),
            per_sender: env_parse("SENDER_INBOX_PER_SENDER").unwrap_or(defaults.per_sender),
            fetch_concurrency: env_parse::<usize>("SENDER_INBOX_FETCH_CONCURRENCY")
                .unwrap_or(defaults.fetch_concurrency)
                .max(1),
        }
    }
}

/// Headless rendering configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// WebDriver endpoint (e.g. a running chromedriver). `None` disables rendering.
    pub webdriver_url: Option<String>,
    pub implicit_wait: Duration,
    /// Upper bound for one whole render, session setup included.
    pub deadline: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            webdriver_url: None,
            implicit_wait: Duration::from_secs(10),
            deadline: Duration::from_secs(30),
        }
    }
}

impl RenderConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let webdriver_url = std::env::var("WEBDRIVER_URL")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        if webdriver_url.is_none() && std::env::var("CHROMEDRIVER_PATH").is_ok() {
            tracing::warn!(
                "CHROMEDRIVER_PATH is set but WEBDRIVER_URL is not; start chromedriver and point WEBDRIVER_URL at it to enable rendering"
            );
        }

        Self {
            webdriver_url,
            implicit_wait: env_parse("RENDER_IMPLICIT_WAIT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.implicit_wait),
            deadline: env_parse("RENDER_DEADLINE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.deadline),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
