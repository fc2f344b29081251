//! REST endpoints: `/senders`, `/emails`, `/health`.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use super::errors::ApiError;
use crate::aggregate::EmailView;
use crate::service::InboxService;

/// Shared state for the inbox routes.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InboxService>,
}

/// Body of `POST /emails`. `senders` wins when both are given.
#[derive(Debug, Deserialize)]
pub struct EmailsRequest {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub senders: Option<Vec<String>>,
}

/// Build the router. Cross-origin requests are allowed from anywhere.
pub fn inbox_routes(service: Arc<InboxService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/senders", get(list_senders))
        .route("/emails", post(list_emails))
        .with_state(AppState { service })
        .layer(CorsLayer::permissive())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "sender-inbox"
    }))
}

/// GET /senders
///
/// Sender addresses seen in the recent-message window.
async fn list_senders(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let senders = state.service.senders().await?;
    info!(count = senders.len(), "Listed senders");
    Ok(Json(senders))
}

/// POST /emails
///
/// `{"sender": ...}` returns that sender's recent messages in provider order;
/// `{"senders": [...]}` merges several senders, newest first.
async fn list_emails(
    State(state): State<AppState>,
    Json(request): Json<EmailsRequest>,
) -> Result<Json<Vec<EmailView>>, ApiError> {
    let emails = match (request.senders, request.sender) {
        (Some(senders), _) => state.service.emails_for_senders(&senders).await?,
        (None, Some(sender)) => state.service.emails_for_sender(&sender).await?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "expected \"sender\" or \"senders\"".to_string(),
            ));
        }
    };
    Ok(Json(emails))
}
