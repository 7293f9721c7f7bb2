//! Calendar date rules: parsing, input validation and week windows.
//!
//! Every comparison works on [`NaiveDate`], which has no time-of-day or
//! offset, so the local time zone can never move a task to another day.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::ValidationError;

/// Canonical storage format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

/// Validate a date entered in a form before it is saved.
///
/// The year must be exactly four digits within 1900..=2100 and the whole
/// value must name a real calendar day.
pub fn validate_date_input(value: &str) -> Result<NaiveDate, ValidationError> {
    let invalid = || ValidationError::InvalidDate(value.to_owned());
    let value = value.trim();
    let year = value.split('-').next().unwrap_or_default();
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}

/// Lenient variant used while the user is still typing: a year with more
/// than four characters is cut down to its first four.
pub fn truncate_year_input(value: &str) -> String {
    let mut parts: Vec<&str> = value.split('-').collect();
    match parts.first() {
        Some(year) if year.chars().count() > 4 => {
            let end = year.char_indices().nth(4).map_or(year.len(), |(i, _)| i);
            parts[0] = &year[..end];
            parts.join("-")
        }
        _ => value.to_owned(),
    }
}

/// Render a date in storage form.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Sunday on or before `anchor`.
pub fn week_start(anchor: NaiveDate) -> NaiveDate {
    anchor - Duration::days(i64::from(anchor.weekday().num_days_from_sunday()))
}

/// Inclusive `[sunday, saturday]` window containing `anchor`.
pub fn week_window(anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = week_start(anchor);
    (start, start + Duration::days(6))
}

/// True when both dates fall in the same calendar month of the same year.
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Last calendar day of the given month (1-based).
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}
