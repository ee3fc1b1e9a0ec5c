//! Date-token parsing and query-time expression rendering.
//!
//! A query's time window is bounded by two user-supplied date tokens. A token
//! is either a negative day offset relative to now (`"-7"` = seven days ago)
//! or an absolute `YYYY-MM-DD` calendar date. Offsets render as `DATE_ADD`
//! expressions; absolute dates are substituted into a timestamp template.

use chrono::NaiveDate;

use crate::error::PypistatError;
use crate::Result;

/// Template for the start of a day, used for range-start bounds.
pub const START_TIMESTAMP: &str = r#"TIMESTAMP("{} 00:00:00")"#;

/// Template for the end of a day, used for range-end bounds.
pub const END_TIMESTAMP: &str = r#"TIMESTAMP("{} 23:59:59")"#;

/// A date token parsed into one of its two valid forms.
enum DateToken {
    /// Day offset relative to now; always negative.
    Offset(i64),
    /// Absolute calendar date.
    Absolute(NaiveDate),
}

fn parse_token(token: &str) -> Result<DateToken> {
    if let Ok(offset) = token.parse::<i64>() {
        if offset < 0 {
            return Ok(DateToken::Offset(offset));
        }
        // An offset of zero or into the future bounds no window at all.
        return Err(PypistatError::InvalidDate {
            token: token.to_string(),
        });
    }

    NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .map(DateToken::Absolute)
        .map_err(|_| PypistatError::InvalidDate {
            token: token.to_string(),
        })
}

/// Check that `token` is a negative day offset or a valid `YYYY-MM-DD` date.
///
/// Calendrically impossible dates (month 19, day 39) are rejected along with
/// non-negative offsets and arbitrary text.
pub fn validate_date(token: &str) -> Result<()> {
    parse_token(token).map(|_| ())
}

/// Render `token` as a query-time timestamp expression.
///
/// Negative offsets become `DATE_ADD(CURRENT_TIMESTAMP(), n, "day")` and never
/// consult `template`. Absolute dates replace the `{}` placeholder in
/// `template` (see [`START_TIMESTAMP`] / [`END_TIMESTAMP`]). The token is
/// always validated first.
pub fn format_date(token: &str, template: &str) -> Result<String> {
    match parse_token(token)? {
        DateToken::Offset(offset) => Ok(format!(
            "DATE_ADD(CURRENT_TIMESTAMP(), {}, \"day\")",
            offset
        )),
        DateToken::Absolute(date) => {
            Ok(template.replacen("{}", &date.format("%Y-%m-%d").to_string(), 1))
        }
    }
}
