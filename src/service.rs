//! Inbox service: sender listing and per-sender body retrieval.

use std::sync::Arc;

use tracing::{debug, info};

use crate::aggregate::{DatedEmail, EmailView, order_by_date_desc, parse_message_date};
use crate::body::{self, NO_CONTENT};
use crate::config::InboxConfig;
use crate::error::Error;
use crate::gmail::{ListQuery, MailApi, MessageDetail};
use crate::index::{SenderIndex, build_sender_index};
use crate::links::rewrite_links;
use crate::render::Renderer;

/// Stateless per call; holds only its collaborators.
pub struct InboxService {
    api: Arc<dyn MailApi>,
    renderer: Arc<dyn Renderer>,
    config: InboxConfig,
}

impl InboxService {
    pub fn new(api: Arc<dyn MailApi>, renderer: Arc<dyn Renderer>, config: InboxConfig) -> Self {
        Self {
            api,
            renderer,
            config,
        }
    }

    pub fn config(&self) -> &InboxConfig {
        &self.config
    }

    /// Group the recent-message window by sender.
    pub async fn sender_index(&self) -> Result<SenderIndex, Error> {
        let index = build_sender_index(
            self.api.as_ref(),
            self.config.scan_window,
            self.config.fetch_concurrency,
        )
        .await?;
        Ok(index)
    }

    /// Sender addresses in the recent window, first-seen order.
    pub async fn senders(&self) -> Result<Vec<String>, Error> {
        let index = self.sender_index().await?;
        Ok(index.addresses().map(str::to_string).collect())
    }

    /// Resolve a message's body: extract, then render and neutralize links
    /// when it is HTML.
    pub async fn resolve_body(&self, message: &MessageDetail) -> Result<String, Error> {
        let Some(extracted) = body::extract_payload(&message.payload) else {
            debug!(message_id = %message.id, "No extractable body");
            return Ok(NO_CONTENT.to_string());
        };

        if !extracted.is_html() {
            return Ok(extracted.text);
        }

        let rendered = self.renderer.render(&extracted.text).await?;
        Ok(rewrite_links(&rendered))
    }

    /// Subject, body and parsed date for the most recent messages of `sender`.
    async fn dated_emails_for(&self, sender: &str) -> Result<Vec<DatedEmail>, Error> {
        let handles = self
            .api
            .list_messages(&ListQuery::from_sender(sender, self.config.per_sender))
            .await?;

        let mut emails = Vec::with_capacity(handles.len());
        for handle in &handles {
            let message = self.api.get_message(&handle.id).await?;
            let body = self.resolve_body(&message).await?;
            emails.push(DatedEmail {
                view: EmailView {
                    subject: message.subject().to_string(),
                    body,
                },
                date: message.header("Date").and_then(parse_message_date),
            });
        }
        Ok(emails)
    }

    /// Most recent messages from one sender, in provider order.
    ///
    /// An address with no messages yields an empty list.
    pub async fn emails_for_sender(&self, sender: &str) -> Result<Vec<EmailView>, Error> {
        let emails = self.dated_emails_for(sender).await?;
        info!(sender, count = emails.len(), "Fetched sender emails");
        Ok(emails.into_iter().map(|e| e.view).collect())
    }

    /// Most recent messages across several senders, newest first.
    pub async fn emails_for_senders(&self, senders: &[String]) -> Result<Vec<EmailView>, Error> {
        let mut all = Vec::new();
        for sender in senders {
            all.extend(self.dated_emails_for(sender).await?);
        }
        info!(senders = senders.len(), count = all.len(), "Fetched emails for senders");
        Ok(order_by_date_desc(all))
    }
}
