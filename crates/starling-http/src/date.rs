//! HTTP date formatting (RFC 1123, always GMT).

use std::time::SystemTime;

use chrono::{DateTime, Utc};

/// Formats a timestamp as an HTTP date, e.g. `Thu, 01 Jan 1970 00:00:00 GMT`.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Formats a filesystem timestamp as an HTTP date.
pub fn http_date_from_system(at: SystemTime) -> String {
    http_date(DateTime::<Utc>::from(at))
}

/// The Unix epoch, used to expire cookies immediately.
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from(SystemTime::UNIX_EPOCH)
}
