//! Gmail API access: wire types and the HTTP client.

pub mod client;
pub mod types;

pub use client::{GmailClient, MailApi};
pub use types::{Header, ListQuery, MessageDetail, MessagePart, MessageSummary, PartBody};
