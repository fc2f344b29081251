//! Gmail REST client over reqwest.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{ListMessagesResponse, ListQuery, MessageDetail, MessageSummary};
use crate::auth::TokenProvider;
use crate::config::GmailConfig;
use crate::error::GmailError;

/// The two mail-provider calls the service depends on.
#[async_trait]
pub trait MailApi: Send + Sync {
    /// List message handles, most recent first.
    async fn list_messages(&self, query: &ListQuery) -> Result<Vec<MessageSummary>, GmailError>;

    /// Fetch one message in full.
    async fn get_message(&self, id: &str) -> Result<MessageDetail, GmailError>;
}

/// Gmail API v1 client.
pub struct GmailClient {
    http: Client,
    api_base: String,
    user_id: String,
    tokens: Arc<dyn TokenProvider>,
}

impl GmailClient {
    pub fn new(config: &GmailConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        Self::with_client(config, tokens, Client::new())
    }

    pub fn with_client(config: &GmailConfig, tokens: Arc<dyn TokenProvider>, http: Client) -> Self {
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            user_id: config.user_id.clone(),
            tokens,
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/users/{}/messages", self.api_base, self.user_id)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, GmailError> {
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .query(params)
            .send()
            .await
            .map_err(|e| GmailError::Transport {
                operation: operation.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GmailError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GmailError::InvalidResponse {
                operation: operation.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl MailApi for GmailClient {
    async fn list_messages(&self, query: &ListQuery) -> Result<Vec<MessageSummary>, GmailError> {
        let mut params = vec![("maxResults", query.max_results.to_string())];
        if let Some(q) = &query.query {
            params.push(("q", q.clone()));
        }

        let response: ListMessagesResponse = self
            .get_json("messages.list", &self.messages_url(), &params)
            .await?;

        debug!(
            count = response.messages.len(),
            query = ?query.query,
            "Listed messages"
        );
        Ok(response.messages)
    }

    async fn get_message(&self, id: &str) -> Result<MessageDetail, GmailError> {
        let url = format!("{}/{}", self.messages_url(), id);
        self.get_json("messages.get", &url, &[("format", "full".to_string())])
            .await
    }
}
