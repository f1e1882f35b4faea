//! Conversions between unix timestamps and the date text shown to users.
//!
//! All conversions use UTC.

use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::error::{Error, Result};

/// Parses a `MM/DD/YYYY` date into the unix time of its midnight (UTC).
///
/// # Errors
///
/// Returns [`Error::Format`] for any other shape or an impossible date.
///
/// # Examples
///
/// ```
/// use campus_power::calendar::parse_date;
///
/// assert_eq!(parse_date("12/09/2013").unwrap(), 1_386_547_200);
/// ```
pub fn parse_date(text: &str) -> Result<i64> {
    let format = format_description!("[month]/[day]/[year]");
    let date = Date::parse(text.trim(), &format)
        .map_err(|e| Error::format(format!("date {text:?} must be MM/DD/YYYY: {e}")))?;
    Ok(date.midnight().assume_utc().unix_timestamp())
}

/// Long form of a timestamp, e.g. `May 7, 2014 at 08:30`.
///
/// # Errors
///
/// Returns [`Error::Format`] if `unix` is outside the supported date range.
pub fn describe(unix: i64) -> Result<String> {
    let format =
        format_description!("[month repr:long] [day padding:none], [year] at [hour repr:12]:[minute]");
    to_datetime(unix)?
        .format(&format)
        .map_err(|e| Error::format(format!("cannot format {unix}: {e}")))
}

/// Day label of a timestamp, e.g. `December 9`.
///
/// # Errors
///
/// Returns [`Error::Format`] if `unix` is outside the supported date range.
pub fn day_label(unix: i64) -> Result<String> {
    let format = format_description!("[month repr:long] [day padding:none]");
    to_datetime(unix)?
        .format(&format)
        .map_err(|e| Error::format(format!("cannot format {unix}: {e}")))
}

fn to_datetime(unix: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(unix)
        .map_err(|e| Error::format(format!("timestamp {unix} out of range: {e}")))
}
