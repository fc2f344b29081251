//! Sender index: recent messages grouped by normalized sender address.

use std::collections::HashMap;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::debug;

use crate::error::GmailError;
use crate::gmail::{ListQuery, MailApi, MessageDetail, MessageSummary};

/// `From` value used when a message has no `From` header.
pub const UNKNOWN_SENDER: &str = "Unknown Sender";

/// Reduce a `From` header to a bare address.
///
/// Takes the last whitespace-separated token and strips one leading `<` and
/// one trailing `>`. `"Ann <ann@x.com>"` and `"ann@x.com"` both become
/// `ann@x.com`.
pub fn normalize_sender(from: &str) -> String {
    let last = from.split_whitespace().next_back().unwrap_or("");
    let last = last.strip_prefix('<').unwrap_or(last);
    let last = last.strip_suffix('>').unwrap_or(last);
    last.to_string()
}

/// The grouping key for a message.
pub fn sender_of(message: &MessageDetail) -> String {
    normalize_sender(message.header("From").unwrap_or(UNKNOWN_SENDER))
}

/// Messages grouped by sender address.
///
/// Keys iterate in first-seen order; each group keeps insertion order.
#[derive(Debug, Clone, Default)]
pub struct SenderIndex {
    positions: HashMap<String, usize>,
    groups: Vec<(String, Vec<MessageDetail>)>,
}

impl SenderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` under `address`, creating the group if needed.
    pub fn insert(&mut self, address: String, message: MessageDetail) {
        match self.positions.get(&address) {
            Some(&pos) => self.groups[pos].1.push(message),
            None => {
                self.positions.insert(address.clone(), self.groups.len());
                self.groups.push((address, vec![message]));
            }
        }
    }

    /// Group a sequence of messages by their normalized `From` address.
    pub fn from_messages(messages: impl IntoIterator<Item = MessageDetail>) -> Self {
        let mut index = Self::new();
        for message in messages {
            index.insert(sender_of(&message), message);
        }
        index
    }

    pub fn get(&self, address: &str) -> Option<&[MessageDetail]> {
        self.positions
            .get(address)
            .map(|&pos| self.groups[pos].1.as_slice())
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(address, _)| address.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[MessageDetail])> {
        self.groups
            .iter()
            .map(|(address, messages)| (address.as_str(), messages.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Fetch each handle's detail, at most `concurrency` at a time, in listing order.
pub async fn fetch_details(
    api: &dyn MailApi,
    handles: &[MessageSummary],
    concurrency: usize,
) -> Result<Vec<MessageDetail>, GmailError> {
    let fetches: Vec<_> = handles
        .iter()
        .map(|handle| api.get_message(&handle.id))
        .collect();
    stream::iter(fetches)
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

/// List the `window` most recent messages and group them by sender.
pub async fn build_sender_index(
    api: &dyn MailApi,
    window: u32,
    concurrency: usize,
) -> Result<SenderIndex, GmailError> {
    let handles = api.list_messages(&ListQuery::recent(window)).await?;
    let details = fetch_details(api, &handles, concurrency).await?;
    let index = SenderIndex::from_messages(details);

    debug!(
        scanned = handles.len(),
        senders = index.len(),
        "Built sender index"
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use async_trait::async_trait;

    use crate::gmail::{Header, MessagePart};

    fn message(id: &str, from: Option<&str>) -> MessageDetail {
        let headers = from
            .map(|f| {
                vec![Header {
                    name: "From".into(),
                    value: f.into(),
                }]
            })
            .unwrap_or_default();
        MessageDetail {
            id: id.into(),
            payload: MessagePart {
                headers,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn ids(messages: &[MessageDetail]) -> Vec<&str> {
        messages.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn normalizes_display_name_form() {
        assert_eq!(normalize_sender("Display Name <addr@x.com>"), "addr@x.com");
        assert_eq!(normalize_sender("\"Doe, Jane\" <jane@x.com>"), "jane@x.com");
    }

    #[test]
    fn bare_address_is_unchanged() {
        assert_eq!(normalize_sender("addr@x.com"), "addr@x.com");
        assert_eq!(normalize_sender("<addr@x.com>"), "addr@x.com");
    }

    #[test]
    fn strips_only_one_bracket_each_side() {
        assert_eq!(normalize_sender("<<a@x.com>>"), "<a@x.com>");
        assert_eq!(normalize_sender(""), "");
    }

    #[test]
    fn missing_from_uses_last_word_of_placeholder() {
        assert_eq!(sender_of(&message("1", None)), "Sender");
    }

    #[test]
    fn groups_preserve_arrival_order() {
        let index = SenderIndex::from_messages(vec![
            message("msg1", Some("A <a@x.com>")),
            message("msg2", Some("b@x.com")),
            message("msg3", Some("a@x.com")),
        ]);

        assert_eq!(
            index.addresses().collect::<Vec<_>>(),
            vec!["a@x.com", "b@x.com"]
        );
        assert_eq!(ids(index.get("a@x.com").unwrap()), vec!["msg1", "msg3"]);
        assert_eq!(ids(index.get("b@x.com").unwrap()), vec!["msg2"]);
        assert!(index.get("c@x.com").is_none());
    }

    /// Responds slower for earlier ids so concurrent fetches finish out of order.
    struct SlowFirst {
        messages: Vec<MessageDetail>,
    }

    #[async_trait]
    impl MailApi for SlowFirst {
        async fn list_messages(
            &self,
            query: &ListQuery,
        ) -> Result<Vec<MessageSummary>, GmailError> {
            Ok(self
                .messages
                .iter()
                .take(query.max_results as usize)
                .map(|m| MessageSummary {
                    id: m.id.clone(),
                    thread_id: None,
                })
                .collect())
        }

        async fn get_message(&self, id: &str) -> Result<MessageDetail, GmailError> {
            let pos = self
                .messages
                .iter()
                .position(|m| m.id == id)
                .ok_or_else(|| GmailError::Status {
                    operation: "messages.get".into(),
                    status: 404,
                    body: String::new(),
                })?;
            let delay = (self.messages.len() - pos) as u64 * 10;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(self.messages[pos].clone())
        }
    }

    #[tokio::test]
    async fn concurrent_fetch_keeps_sequential_order() {
        let api = SlowFirst {
            messages: vec![
                message("m1", Some("a@x.com")),
                message("m2", Some("b@x.com")),
                message("m3", Some("a@x.com")),
                message("m4", Some("a@x.com")),
            ],
        };

        let index = build_sender_index(&api, 50, 4).await.unwrap();
        assert_eq!(ids(index.get("a@x.com").unwrap()), vec!["m1", "m3", "m4"]);
        assert_eq!(
            index.addresses().collect::<Vec<_>>(),
            vec!["a@x.com", "b@x.com"]
        );
    }

    #[tokio::test]
    async fn window_limits_scan() {
        let api = SlowFirst {
            messages: vec![
                message("m1", Some("a@x.com")),
                message("m2", Some("b@x.com")),
                message("m3", Some("c@x.com")),
            ],
        };
        let index = build_sender_index(&api, 2, 1).await.unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.get("c@x.com").is_none());
    }
}
