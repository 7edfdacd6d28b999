//! Date-threshold alert classification
//!
//! Global invariants enforced:
//! - Classification is a pure function of (date, policy, today)
//! - Past dates are always Critical, regardless of policy
//! - The warning window is inclusive at both ends (today .. today + N months)
//! - Absent and invalid dates are always Normal

use crate::date::{add_months_overflowing, ReviewDate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Three-way alert classification, ordered by severity
///
/// `Ord` follows severity: `Critical > Warning > Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
    Warning,
    Normal,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Critical => "critical",
            AlertLevel::Warning => "warning",
            AlertLevel::Normal => "normal",
        }
    }

    fn severity(&self) -> u8 {
        match self {
            AlertLevel::Critical => 2,
            AlertLevel::Warning => 1,
            AlertLevel::Normal => 0,
        }
    }
}

impl Ord for AlertLevel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl PartialOrd for AlertLevel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Width of the warning window ahead of today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    pub window_months: u32,
}

impl AlertPolicy {
    /// Supplier re-evaluation dates: warn one month ahead
    pub const REVIEW: AlertPolicy = AlertPolicy { window_months: 1 };
    /// ISO 9001 certificate expiry: warn three months ahead
    pub const ISO_EXPIRY: AlertPolicy = AlertPolicy { window_months: 3 };

    pub fn new(window_months: u32) -> Self {
        AlertPolicy { window_months }
    }

    /// Last date (inclusive) that still falls in the warning window
    pub fn window_end(&self, today: NaiveDate) -> NaiveDate {
        add_months_overflowing(today, self.window_months).unwrap_or(NaiveDate::MAX)
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        AlertPolicy::REVIEW
    }
}

/// Classify a parsed date against a policy
pub fn classify(date: &ReviewDate, policy: AlertPolicy, today: NaiveDate) -> AlertLevel {
    let ReviewDate::Valid(date) = date else {
        return AlertLevel::Normal;
    };

    if *date < today {
        AlertLevel::Critical
    } else if *date <= policy.window_end(today) {
        AlertLevel::Warning
    } else {
        AlertLevel::Normal
    }
}

/// Classify a review date (one-month warning window)
///
/// `None`, empty text and unparseable text all yield `Normal`.
pub fn determine_alert_level(input: Option<&str>, today: NaiveDate) -> AlertLevel {
    classify(&ReviewDate::from_option(input), AlertPolicy::REVIEW, today)
}

/// Classify an ISO certificate expiry date (three-month warning window)
pub fn determine_iso_expiry_alert(input: Option<&str>, today: NaiveDate) -> AlertLevel {
    classify(
        &ReviewDate::from_option(input),
        AlertPolicy::ISO_EXPIRY,
        today,
    )
}

/// Whole days elapsed since `date`
///
/// Signed: a future date yields a negative count. Dates have no time of day,
/// so the difference is always a whole number of days and rounding up is the
/// identity.
pub fn calculate_days_overdue(date: NaiveDate, today: NaiveDate) -> i64 {
    (today - date).num_days()
}

/// Whole days until `date`; negative for past dates
pub fn calculate_days_remaining(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}
