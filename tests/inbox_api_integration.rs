//! Integration tests for the inbox REST API.
//!
//! Each test spins up the real router on a random port with in-memory mail
//! and renderer stubs, then talks to it over HTTP with reqwest.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use sender_inbox::api::inbox_routes;
use sender_inbox::config::InboxConfig;
use sender_inbox::error::{GmailError, RenderError};
use sender_inbox::gmail::{ListQuery, MailApi, MessageDetail, MessageSummary};
use sender_inbox::index::sender_of;
use sender_inbox::render::Renderer;
use sender_inbox::service::InboxService;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// In-memory mailbox, most recent first.
struct StubMail {
    messages: Vec<MessageDetail>,
}

#[async_trait]
impl MailApi for StubMail {
    async fn list_messages(&self, query: &ListQuery) -> Result<Vec<MessageSummary>, GmailError> {
        let wanted = query.query.as_deref().and_then(|q| q.strip_prefix("from:"));
        Ok(self
            .messages
            .iter()
            .filter(|m| wanted.is_none_or(|w| sender_of(m) == w))
            .take(query.max_results as usize)
            .map(|m| MessageSummary {
                id: m.id.clone(),
                thread_id: None,
            })
            .collect())
    }

    async fn get_message(&self, id: &str) -> Result<MessageDetail, GmailError> {
        self.messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| GmailError::Status {
                operation: "messages.get".into(),
                status: 404,
                body: String::new(),
            })
    }
}

/// Pretends to be a browser: wraps the markup in a document.
struct StubRenderer;

#[async_trait]
impl Renderer for StubRenderer {
    async fn render(&self, html: &str) -> Result<String, RenderError> {
        Ok(format!("<html><body>{html}</body></html>"))
    }
}

fn b64(text: &str) -> String {
    URL_SAFE.encode(text)
}

fn gmail_message(id: &str, from: &str, subject: &str, date: &str, payload: Value) -> MessageDetail {
    let mut payload = payload;
    payload["headers"] = json!([
        {"name": "From", "value": from},
        {"name": "Subject", "value": subject},
        {"name": "Date", "value": date},
    ]);
    serde_json::from_value(json!({ "id": id, "payload": payload })).unwrap()
}

fn mailbox() -> Vec<MessageDetail> {
    vec![
        gmail_message(
            "m1",
            "Newsletter <news@example.com>",
            "Weekly digest",
            "Fri, 05 Jan 2024 08:00:00 +0000 (UTC)",
            json!({
                "mimeType": "multipart/alternative",
                "parts": [
                    {"mimeType": "text/html", "body": {"size": 1, "data": b64("<p>Hot <a href=\"https://news.example/1\">story</a></p>")}},
                    {"mimeType": "text/plain", "body": {"size": 1, "data": b64("Hot story")}}
                ]
            }),
        ),
        gmail_message(
            "m2",
            "friend@example.com",
            "Lunch?",
            "Thu, 04 Jan 2024 12:00:00 +0000",
            json!({"mimeType": "text/plain", "body": {"size": 5, "data": b64("Noon?")}}),
        ),
        gmail_message(
            "m3",
            "Newsletter <news@example.com>",
            "Last week",
            "Tue, 02 Jan 2024 08:00:00 +0000",
            json!({"mimeType": "multipart/mixed", "body": {"size": 0}}),
        ),
    ]
}

/// Start the API on a random port, return the base URL.
async fn start_server() -> String {
    let api: Arc<dyn MailApi> = Arc::new(StubMail {
        messages: mailbox(),
    });
    let service = InboxService::new(api, Arc::new(StubRenderer), InboxConfig::default());
    let app = inbox_routes(Arc::new(service));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{port}")
}

#[tokio::test]
async fn health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let resp = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "sender-inbox");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn senders_are_unique_in_first_seen_order() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let resp = reqwest::get(format!("{base}/senders")).await.unwrap();
        assert_eq!(resp.status(), 200);

        let senders: Vec<String> = resp.json().await.unwrap();
        assert_eq!(senders, vec!["news@example.com", "friend@example.com"]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn single_sender_returns_rendered_bodies() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/emails"))
            .json(&json!({"sender": "news@example.com"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let emails: Vec<Value> = resp.json().await.unwrap();
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0]["subject"], "Weekly digest");
        assert_eq!(
            emails[0]["body"],
            "<html><body><p>Hot <a href=\"https://news.example/1\">click here</a></p></body></html>"
        );
        assert_eq!(emails[1]["subject"], "Last week");
        assert_eq!(emails[1]["body"], "No content found.");
        assert!(emails[0].get("date").is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unknown_sender_is_empty_array() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/emails"))
            .json(&json!({"sender": "stranger@example.com"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let emails: Vec<Value> = resp.json().await.unwrap();
        assert!(emails.is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn multiple_senders_sorted_newest_first() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/emails"))
            .json(&json!({"senders": ["friend@example.com", "news@example.com"]}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let emails: Vec<Value> = resp.json().await.unwrap();
        let subjects: Vec<&str> = emails.iter().map(|e| e["subject"].as_str().unwrap()).collect();
        assert_eq!(subjects, vec!["Weekly digest", "Lunch?", "Last week"]);
        assert_eq!(emails[1]["body"], "Noon?");
        assert!(emails.iter().all(|e| e.as_object().unwrap().len() == 2));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn missing_sender_field_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/emails"))
            .json(&json!({}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());
    })
    .await
    .expect("test timed out");
}
