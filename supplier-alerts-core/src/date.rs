//! Review date parsing and calendar-month arithmetic
//!
//! Global invariants enforced:
//! - Dates carry no time of day; any time suffix in the input is discarded
//! - Month addition rolls day overflow forward into the next month, never clamps
//! - Parsing never fails: unreadable text becomes `ReviewDate::Invalid`
//! - Month-before-day order for slash dates without a leading year

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// A date cell value after parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDate {
    /// Empty or whitespace-only input
    Absent,
    /// Text that is not a recognizable calendar date
    Invalid(String),
    /// A calendar date (midnight-normalized)
    Valid(NaiveDate),
}

impl ReviewDate {
    /// Parse free text taken from a table cell
    ///
    /// Accepted forms (surrounding whitespace ignored):
    /// - `2025-11-20`, `2025/11/20`, `2025.11.20` (month/day may be one digit)
    /// - any of the above followed by `T10:30`, ` 10:30:00`, etc. (time discarded)
    /// - `2025年11月20日`
    /// - `11/20/2025`, `Nov 20, 2025`, `20 November 2025`, `Thu Nov 20 2025`
    pub fn parse(input: &str) -> Self {
        let text = input.trim();
        if text.is_empty() {
            return ReviewDate::Absent;
        }

        match parse_calendar_date(text) {
            Some(date) => ReviewDate::Valid(date),
            None => ReviewDate::Invalid(text.to_string()),
        }
    }

    /// Parse an optional input; `None` is treated the same as empty text
    pub fn from_option(input: Option<&str>) -> Self {
        input.map(ReviewDate::parse).unwrap_or(ReviewDate::Absent)
    }

    /// The parsed date, if valid
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            ReviewDate::Valid(date) => Some(*date),
            _ => None,
        }
    }
}

fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    static NUMERIC_RE: OnceLock<Regex> = OnceLock::new();
    let numeric_re = NUMERIC_RE.get_or_init(|| {
        Regex::new(
            r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})(?:[T ]\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$",
        )
        .unwrap()
    });

    static KANJI_RE: OnceLock<Regex> = OnceLock::new();
    let kanji_re =
        KANJI_RE.get_or_init(|| Regex::new(r"^(\d{4})年\s*(\d{1,2})月\s*(\d{1,2})日$").unwrap());

    let Some(caps) = numeric_re
        .captures(text)
        .or_else(|| kanji_re.captures(text))
    else {
        return parse_host_form(text);
    };

    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;

    // Out-of-range components (2025-02-30, 2025-13-01) are invalid, not rolled over
    NaiveDate::from_ymd_opt(year, month, day)
}

/// US and month-name forms a browser date parser also understands
///
/// `%B` and `%A` accept the abbreviated names too, case-insensitively.
const HOST_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%A %B %d %Y",
    "%A, %B %d, %Y",
];

fn parse_host_form(text: &str) -> Option<NaiveDate> {
    HOST_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Add calendar months, letting the day overflow into the following month
///
/// `2025-01-31 + 1 month` is `2025-03-03` (February has 28 days, so the three
/// surplus days roll forward), `2024-01-31 + 1 month` is `2024-03-02`.
/// Returns `None` only when the result leaves chrono's representable range.
pub fn add_months_overflowing(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let zero_based = date.year() as i64 * 12 + date.month0() as i64 + months as i64;
    let year = i32::try_from(zero_based.div_euclid(12)).ok()?;
    let month = zero_based.rem_euclid(12) as u32 + 1;

    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first.checked_add_days(Days::new(u64::from(date.day() - 1)))
}
