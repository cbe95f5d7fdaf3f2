//! Column encoding shared by the repositories.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings so that
//! lexical order matches chronological order.

use std::str::FromStr;

use chrono::SecondsFormat;

use crmflow_domain::time::Timestamp;

pub(crate) fn encode_ts(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_ts(value: &str) -> Result<Timestamp, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.to_utc())
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

pub(crate) fn decode_opt_ts(value: Option<String>) -> Result<Option<Timestamp>, sqlx::Error> {
    value.as_deref().map(decode_ts).transpose()
}

/// Parse a column through its [`FromStr`] implementation.
pub(crate) fn decode<T>(value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

/// Narrow an integer column, failing the row on overflow.
pub(crate) fn narrow<T: TryFrom<i64, Error = std::num::TryFromIntError>>(
    value: i64,
) -> Result<T, sqlx::Error> {
    T::try_from(value).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}
