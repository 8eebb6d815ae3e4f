//! Calendar rules for recurring definitions.
//!
//! Two pure functions drive the scheduler:
//!
//! - [`is_due`] decides whether a definition fires on the day of `now`.
//! - [`advance`] computes the next due date from the current one.
//!
//! Month and year steps clamp to the last day of the target month, so a
//! definition due on the 31st is due on 2024-02-29 one month later and on
//! 2024-03-29 the month after that.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use crate::error::LedgerError;

/// Step used for stored frequency tags that are blank or unknown.
const FALLBACK_STEP_DAYS: u64 = 7;

/// The closed set of recurrence frequencies accepted at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    /// Only valid for recurring expenses.
    Annually,
}

impl Frequency {
    /// Parses a submitted tag. Surrounding whitespace and case are ignored.
    pub fn parse(tag: &str) -> Option<Self> {
        Self::from_tag(&tag.trim().to_ascii_lowercase())
    }

    /// Matches a stored tag exactly, as written by the entry services.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "weekly" => Some(Frequency::Weekly),
            "biweekly" => Some(Frequency::Biweekly),
            "monthly" => Some(Frequency::Monthly),
            "annually" => Some(Frequency::Annually),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
            Frequency::Annually => "annually",
        }
    }

    /// Income sources are paid weekly, biweekly or monthly.
    pub fn allowed_for_income(self) -> bool {
        !matches!(self, Frequency::Annually)
    }

    /// The date one period after `date`.
    pub fn advance(self, date: NaiveDate) -> NaiveDate {
        let next = match self {
            Frequency::Weekly => date.checked_add_days(Days::new(7)),
            Frequency::Biweekly => date.checked_add_days(Days::new(14)),
            Frequency::Monthly => date.checked_add_months(Months::new(1)),
            Frequency::Annually => date.checked_add_months(Months::new(12)),
        };
        next.unwrap_or(NaiveDate::MAX)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Frequency::parse(s)
            .ok_or_else(|| LedgerError::validation(format!("unrecognized frequency '{}'", s.trim())))
    }
}

/// Advances `date` by the period named by a stored frequency tag.
///
/// Tags must match exactly; anything else, including a differently cased
/// tag, advances by seven days. The input is never modified.
pub fn advance(date: NaiveDate, tag: &str) -> NaiveDate {
    match Frequency::from_tag(tag) {
        Some(frequency) => frequency.advance(date),
        None => date
            .checked_add_days(Days::new(FALLBACK_STEP_DAYS))
            .unwrap_or(NaiveDate::MAX),
    }
}

/// True only when `due` is the same UTC calendar day as `now`.
///
/// A due date in the past is not due: missed days are not caught up.
pub fn is_due(now: DateTime<Utc>, due: NaiveDate) -> bool {
    now.date_naive() == due
}

/// Midnight UTC at the start of `date`, for callers that pick the processing day.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// How the batch treats candidates returned by the pre-filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuePolicy {
    /// Fire only on the exact due day ([`is_due`]).
    #[default]
    ExactDay,
    /// Fire any occurrence whose due day is today or earlier, one per run.
    CatchUp,
}

impl DuePolicy {
    pub fn fires(self, now: DateTime<Utc>, due: NaiveDate) -> bool {
        match self {
            DuePolicy::ExactDay => is_due(now, due),
            DuePolicy::CatchUp => due <= now.date_naive(),
        }
    }
}
