//! Gmail REST wire types (`users.messages.list` / `users.messages.get`).

use serde::{Deserialize, Serialize};

/// Opaque handle returned by the listing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Response body of `users.messages.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesResponse {
    #[serde(default)]
    pub messages: Vec<MessageSummary>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Parameters for a listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub max_results: u32,
    /// Gmail search expression, e.g. `from:alice@example.com`.
    pub query: Option<String>,
}

impl ListQuery {
    /// The most recent `max_results` messages.
    pub fn recent(max_results: u32) -> Self {
        Self {
            max_results,
            query: None,
        }
    }

    /// The most recent `max_results` messages sent by `address`.
    pub fn from_sender(address: &str, max_results: u32) -> Self {
        Self {
            max_results,
            query: Some(format!("from:{address}")),
        }
    }
}

/// A single header entry. Order in the payload is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Body of a part. `data` is URL-safe base64.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,
}

/// A node of the message payload as Gmail sends it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<PartBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<MessagePart>>,
}

impl MessagePart {
    /// Inline body data, if any. Empty strings count as absent.
    pub fn data(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .filter(|d| !d.is_empty())
    }
}

/// Full message as returned by `users.messages.get` (format=full).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetail {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub payload: MessagePart,
}

impl MessageDetail {
    /// First header whose name matches exactly (case-sensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .headers
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.value.as_str())
    }

    /// The `Subject` header, or `"No Subject"` when absent.
    pub fn subject(&self) -> &str {
        self.header("Subject").unwrap_or(NO_SUBJECT)
    }
}

/// Subject used when a message carries no `Subject` header.
pub const NO_SUBJECT: &str = "No Subject";
