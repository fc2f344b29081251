//! HTTP surface.

pub mod errors;
pub mod routes;

pub use errors::ApiError;
pub use routes::{AppState, EmailsRequest, inbox_routes};
