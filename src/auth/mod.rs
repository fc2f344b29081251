//! OAuth token handling for the Gmail API.

pub mod session;
pub mod token;

pub use session::{AuthSession, StaticToken, TokenProvider};
pub use token::StoredToken;
