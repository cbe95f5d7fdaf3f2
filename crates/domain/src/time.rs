//! Time and timestamp helpers.

use chrono::{DateTime, Utc, Weekday};

/// UTC timestamp used for `last_run_at`, execution records, contact activity, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Parse a weekday name such as `"sun"`, `"Sunday"` or `"WED"`.
#[must_use]
pub fn parse_weekday(value: &str) -> Option<Weekday> {
    value.trim().parse().ok()
}
