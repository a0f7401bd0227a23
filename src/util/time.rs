//! Time helpers for cache expiry bookkeeping.
//!
//! Expirable entities store `cached_until` as a Unix timestamp in seconds.

use chrono::{DateTime, Duration, Utc};

/// Fallback expiry applied when ESI omits or mangles the `Expires` header.
pub const DEFAULT_EXPIRY_MINUTES: i64 = 60;

/// Parses an HTTP `Expires` header (`Mon, 02 Jan 2006 15:04:05 GMT`).
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Expiry for freshly fetched data when no header is available.
pub fn default_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(DEFAULT_EXPIRY_MINUTES)
}
