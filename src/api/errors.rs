//! Mapping of service errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use crate::error::{Error, GmailError, RenderError};

/// Error returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Service(#[from] Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Service(Error::Auth(_)) | Self::Service(Error::Gmail(GmailError::Auth(_))) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Service(Error::Gmail(_)) => StatusCode::BAD_GATEWAY,
            Self::Service(Error::Render(RenderError::Timeout { .. })) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            Self::Service(Error::Render(_)) => StatusCode::BAD_GATEWAY,
            Self::Service(Error::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Service(Error::Gmail(e)) => e.upstream_status(),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let mut body = json!({ "error": self.to_string() });
        if let Some(upstream) = self.upstream_status() {
            body["upstream_status"] = json!(upstream);
        }
        (status, Json(body)).into_response()
    }
}
