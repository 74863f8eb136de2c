//! Resolves `YYYY-MM` and `YYYY` period tokens into half-open date ranges.

use time::{Date, Month};

use crate::Error;

const INVALID_MONTH: &str = "Invalid or missing month (use YYYY-MM)";
const INVALID_YEAR: &str = "Invalid or missing year (use YYYY)";

/// A half-open range of calendar dates: `from` is included, `to` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: Date,
    pub to: Date,
}

impl DateRange {
    /// Every date in the range in ascending order.
    pub fn days(self) -> impl Iterator<Item = Date> {
        std::iter::successors(Some(self.from), |date| date.next_day())
            .take_while(move |date| *date < self.to)
    }
}

/// Resolve a `YYYY-MM` token to `[first of month, first of next month)`.
///
/// # Errors
///
/// Returns [Error::InvalidPeriod] if the token is missing, does not match
/// `YYYY-MM`, names a month outside `01..=12`, or the range would end after
/// the last representable date.
pub fn resolve_month(token: Option<&str>) -> Result<DateRange, Error> {
    let invalid = || Error::InvalidPeriod(INVALID_MONTH.to_owned());
    let token = token.ok_or_else(invalid)?;

    let (year, month) = token.split_once('-').ok_or_else(invalid)?;
    if !all_digits(year, 4) || !all_digits(month, 2) {
        return Err(invalid());
    }

    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u8 = month.parse().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;

    let from = Date::from_calendar_date(year, month, 1).map_err(|_| invalid())?;
    let to = match month {
        Month::December => Date::from_calendar_date(year + 1, Month::January, 1),
        _ => Date::from_calendar_date(year, month.next(), 1),
    }
    .map_err(|_| invalid())?;

    Ok(DateRange { from, to })
}

/// Resolve a `YYYY` token to `[1 January, 1 January of the next year)`.
///
/// # Errors
///
/// Returns [Error::InvalidPeriod] if the token is missing, is not exactly four
/// digits, or the range would end after the last representable date.
pub fn resolve_year(token: Option<&str>) -> Result<DateRange, Error> {
    let invalid = || Error::InvalidPeriod(INVALID_YEAR.to_owned());
    let token = token.ok_or_else(invalid)?;

    if !all_digits(token, 4) {
        return Err(invalid());
    }

    let year: i32 = token.parse().map_err(|_| invalid())?;
    let from = Date::from_calendar_date(year, Month::January, 1).map_err(|_| invalid())?;
    let to = Date::from_calendar_date(year + 1, Month::January, 1).map_err(|_| invalid())?;

    Ok(DateRange { from, to })
}

fn all_digits(text: &str, length: usize) -> bool {
    text.len() == length && text.bytes().all(|byte| byte.is_ascii_digit())
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

// Serializes a `Date` as `YYYY-MM-DD`.
time::serde::format_description!(pub(crate) ymd_date, Date, "[year]-[month]-[day]");

/// Format a year and month as `YYYY-MM`.
pub fn format_year_month(year: i32, month: Month) -> String {
    format!("{:04}-{:02}", year, u8::from(month))
}
