//! Multi-sender aggregation: date parsing and most-recent-first ordering.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// `Date` header layout, e.g. `Tue, 02 Jan 2024 10:00:00 +0000`.
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

const UTC_SUFFIX: &str = " (UTC)";

/// What the API returns for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailView {
    pub subject: String,
    pub body: String,
}

/// An [`EmailView`] with the date it is sorted by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedEmail {
    pub view: EmailView,
    pub date: Option<DateTime<FixedOffset>>,
}

/// Parse a `Date` header. A trailing `" (UTC)"` is ignored.
pub fn parse_message_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix(UTC_SUFFIX).unwrap_or(trimmed);
    DateTime::parse_from_str(trimmed, DATE_FORMAT).ok()
}

/// Sort most recent first and drop the dates.
///
/// The sort is stable. Undated entries go last, in fetch order.
pub fn order_by_date_desc(mut emails: Vec<DatedEmail>) -> Vec<EmailView> {
    emails.sort_by(|a, b| b.date.cmp(&a.date));
    emails.into_iter().map(|e| e.view).collect()
}
