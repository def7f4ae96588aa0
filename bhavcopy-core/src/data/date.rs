//! Date normalization and range validation.
//!
//! Every date entering a query passes through [`normalize`], which accepts
//! free-form text as well as already-typed chrono values and returns a plain
//! `NaiveDate` (rendered as `YYYY-MM-DD`). [`validate_range`] then enforces
//! `start <= end`. Both run before a connection is opened.

use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// First trading date held in the stored history.
pub const HISTORY_START: (i32, u32, u32) = (2016, 1, 1);

/// Date-only formats, tried in order. Month-first precedes day-first so an
/// ambiguous `01/02/2023` reads as January 2nd.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%Y%m%d",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d-%b-%Y %H:%M:%S",
];

/// Anything that can be turned into a calendar date.
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Text(s.to_string())
    }
}

impl From<String> for DateInput {
    fn from(s: String) -> Self {
        DateInput::Text(s)
    }
}

impl From<&String> for DateInput {
    fn from(s: &String) -> Self {
        DateInput::Text(s.clone())
    }
}

impl From<NaiveDate> for DateInput {
    fn from(d: NaiveDate) -> Self {
        DateInput::Date(d)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(dt: NaiveDateTime) -> Self {
        DateInput::DateTime(dt)
    }
}

impl From<DateTime<Utc>> for DateInput {
    fn from(dt: DateTime<Utc>) -> Self {
        DateInput::DateTime(dt.naive_utc())
    }
}

impl fmt::Display for DateInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateInput::Text(s) => f.write_str(s),
            DateInput::Date(d) => write!(f, "{d}"),
            DateInput::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

/// Normalize a date input to a calendar date.
pub fn normalize(input: impl Into<DateInput>) -> Result<NaiveDate, ValidationError> {
    match input.into() {
        DateInput::Date(d) => Ok(d),
        DateInput::DateTime(dt) => Ok(dt.date()),
        DateInput::Text(text) => parse_text(&text),
    }
}

fn parse_text(text: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidDate {
            input: text.to_string(),
            reason: "empty input".into(),
        });
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(dt.date_naive());
    }

    Err(ValidationError::InvalidDate {
        input: text.to_string(),
        reason: "unrecognised date format".into(),
    })
}

/// An inclusive, validated date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Whether `date` falls inside the range (both ends inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, counting both ends.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Reject a reversed range.
pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<DateRange, ValidationError> {
    if start > end {
        return Err(ValidationError::InvalidRange { start, end });
    }
    Ok(DateRange { start, end })
}

/// Normalize both ends and validate their order in one step.
pub fn normalize_range(
    start: impl Into<DateInput>,
    end: impl Into<DateInput>,
) -> Result<DateRange, ValidationError> {
    let start = normalize(start)?;
    let end = normalize(end)?;
    validate_range(start, end)
}

/// The first date of stored history.
pub fn history_start() -> NaiveDate {
    let (y, m, d) = HISTORY_START;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn iso_text_parses() {
        assert_eq!(normalize("2023-01-31").unwrap(), ymd(2023, 1, 31));
        assert_eq!(normalize("  2023-01-31 ").unwrap(), ymd(2023, 1, 31));
    }

    #[test]
    fn common_text_forms_parse() {
        assert_eq!(normalize("2023/03/10").unwrap(), ymd(2023, 3, 10));
        assert_eq!(normalize("01-Dec-2023").unwrap(), ymd(2023, 12, 1));
        assert_eq!(normalize("01-DEC-2023").unwrap(), ymd(2023, 12, 1));
        assert_eq!(normalize("1 December 2023").unwrap(), ymd(2023, 12, 1));
        assert_eq!(normalize("Dec 1, 2023").unwrap(), ymd(2023, 12, 1));
        assert_eq!(normalize("2023-12-01T09:15:00").unwrap(), ymd(2023, 12, 1));
        assert_eq!(normalize("2023-12-01 15:30:00").unwrap(), ymd(2023, 12, 1));
        assert_eq!(
            normalize("2023-12-01T09:15:00+05:30").unwrap(),
            ymd(2023, 12, 1)
        );
    }

    #[test]
    fn ambiguous_slashes_read_month_first() {
        assert_eq!(normalize("01/02/2023").unwrap(), ymd(2023, 1, 2));
        // 13 cannot be a month, so the day-first form applies
        assert_eq!(normalize("13/02/2023").unwrap(), ymd(2023, 2, 13));
    }

    #[test]
    fn typed_inputs_pass_through() {
        let d = ymd(2023, 12, 10);
        assert_eq!(normalize(d).unwrap(), d);
        assert_eq!(normalize(d.and_hms_opt(23, 59, 0).unwrap()).unwrap(), d);
    }

    #[test]
    fn empty_and_garbage_are_rejected() {
        assert!(matches!(
            normalize(""),
            Err(ValidationError::InvalidDate { .. })
        ));
        assert!(matches!(
            normalize("not a date"),
            Err(ValidationError::InvalidDate { .. })
        ));
        assert!(matches!(
            normalize("2023-02-30"),
            Err(ValidationError::InvalidDate { .. })
        ));
    }

    #[test]
    fn canonical_text_is_stable() {
        let d = normalize("Dec 5, 2024").unwrap();
        assert_eq!(d.to_string(), "2024-12-05");
        assert_eq!(normalize(d.to_string()).unwrap(), d);
    }

    #[test]
    fn reversed_range_fails() {
        let err = validate_range(ymd(2023, 2, 1), ymd(2023, 1, 1)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidRange {
                start: ymd(2023, 2, 1),
                end: ymd(2023, 1, 1)
            }
        );
    }

    #[test]
    fn single_day_range_is_valid() {
        let r = validate_range(ymd(2023, 1, 2), ymd(2023, 1, 2)).unwrap();
        assert_eq!(r.days(), 1);
        assert!(r.contains(ymd(2023, 1, 2)));
        assert!(!r.contains(ymd(2023, 1, 3)));
    }

    #[test]
    fn normalize_range_combines_both_steps() {
        let r = normalize_range("2023-01-01", ymd(2023, 1, 31)).unwrap();
        assert_eq!(r.to_string(), "2023-01-01 to 2023-01-31");
        assert!(normalize_range("2023-02-01", "2023-01-01").is_err());
        assert!(normalize_range("", "2023-01-01").is_err());
    }

    #[test]
    fn history_starts_in_2016() {
        assert_eq!(history_start(), ymd(2016, 1, 1));
    }
}
