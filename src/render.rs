//! Headless HTML rendering.
//!
//! [`WebDriverRenderer`] speaks the W3C WebDriver protocol to a running
//! browser driver (chromedriver, geckodriver), loads the markup as a `data:`
//! URI and returns the materialized page source.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::RenderConfig;
use crate::error::RenderError;

/// Turns an HTML document into its fully materialized markup.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<String, RenderError>;
}

/// Returns the markup unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughRenderer;

#[async_trait]
impl Renderer for PassthroughRenderer {
    async fn render(&self, html: &str) -> Result<String, RenderError> {
        Ok(html.to_string())
    }
}

#[derive(Deserialize)]
struct WdResponse<T> {
    value: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSession {
    session_id: String,
}

/// Renders through a WebDriver endpoint, one browser session per call.
pub struct WebDriverRenderer {
    http: Client,
    base_url: String,
    implicit_wait: Duration,
    deadline: Duration,
}

impl WebDriverRenderer {
    pub fn new(base_url: impl Into<String>, config: &RenderConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            implicit_wait: config.implicit_wait,
            deadline: config.deadline,
        }
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        step: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RenderError> {
        let webdriver_err = |reason: String| RenderError::WebDriver {
            step: step.to_string(),
            reason,
        };

        let response = request.send().await.map_err(|e| webdriver_err(e.to_string()))?;
        let status = response.status();
        let body: Value = response.json().await.map_err(|e| webdriver_err(e.to_string()))?;

        if !status.is_success() {
            let message = body["value"]["message"]
                .as_str()
                .or_else(|| body["value"]["error"].as_str())
                .unwrap_or("unknown error");
            return Err(webdriver_err(format!("HTTP {}: {}", status.as_u16(), message)));
        }

        serde_json::from_value::<WdResponse<T>>(body)
            .map(|r| r.value)
            .map_err(|e| webdriver_err(format!("unexpected response: {e}")))
    }

    async fn new_session(&self) -> Result<String, RenderError> {
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": ["--headless=new", "--disable-gpu", "--no-sandbox"]
                    }
                }
            }
        });
        let session: NewSession = self
            .call(
                "new session",
                self.http
                    .post(format!("{}/session", self.base_url))
                    .json(&capabilities),
            )
            .await?;
        Ok(session.session_id)
    }

    async fn load_and_read(&self, session: &str, html: &str) -> Result<String, RenderError> {
        let session_url = format!("{}/session/{}", self.base_url, session);

        let _: Value = self
            .call(
                "set timeouts",
                self.http
                    .post(format!("{session_url}/timeouts"))
                    .json(&json!({ "implicit": self.implicit_wait.as_millis() as u64 })),
            )
            .await?;

        let _: Value = self
            .call(
                "navigate",
                self.http
                    .post(format!("{session_url}/url"))
                    .json(&json!({ "url": data_uri(html) })),
            )
            .await?;

        self.call("page source", self.http.get(format!("{session_url}/source")))
            .await
    }

    async fn delete_session(&self, session: &str) {
        let request = self
            .http
            .delete(format!("{}/session/{}", self.base_url, session));
        if let Err(e) = self.call::<Value>("delete session", request).await {
            warn!(session, error = %e, "Failed to close WebDriver session");
        }
    }
}

#[async_trait]
impl Renderer for WebDriverRenderer {
    async fn render(&self, html: &str) -> Result<String, RenderError> {
        let started = Instant::now();
        let timed_out = || RenderError::Timeout {
            timeout: self.deadline,
        };

        let session = tokio::time::timeout(self.deadline, self.new_session())
            .await
            .map_err(|_| timed_out())??;
        debug!(session = %session, "WebDriver session opened");

        let remaining = self.deadline.saturating_sub(started.elapsed());
        let result = tokio::time::timeout(remaining, self.load_and_read(&session, html)).await;

        self.delete_session(&session).await;

        match result {
            Ok(rendered) => rendered,
            Err(_) => Err(timed_out()),
        }
    }
}

/// `data:` URI carrying `html`. Base64 keeps `#` and `%` intact.
pub fn data_uri(html: &str) -> String {
    format!("data:text/html;charset=utf-8;base64,{}", STANDARD.encode(html))
}
