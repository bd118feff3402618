//! Calendar day value type used for every date that crosses the API boundary.
//!
//! The backend stores dates as `DD/MM/YYYY` strings in Indian Standard Time.
//! A [`CalendarDay`] is built from an instant by applying the fixed +5:30
//! offset, so the same instant always maps to the same day regardless of the
//! device's locale or timezone.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed offset of Indian Standard Time from UTC, in seconds (+5:30)
pub const IST_OFFSET_SECONDS: i64 = 5 * 60 * 60 + 30 * 60;

const DAY_FORMAT: &str = "%d/%m/%Y";

/// A calendar date in the ledger's canonical `DD/MM/YYYY` representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    /// Calendar day of `instant` as seen at UTC+5:30
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        let shifted = instant.naive_utc() + Duration::seconds(IST_OFFSET_SECONDS);
        Self(shifted.date())
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Instant of midnight at UTC+5:30 on this day
    pub fn start_instant(&self) -> DateTime<Utc> {
        let local_midnight = self.0.and_time(NaiveTime::MIN);
        let utc_midnight = local_midnight - Duration::seconds(IST_OFFSET_SECONDS);
        DateTime::from_naive_utc_and_offset(utc_midnight, Utc)
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

/// Error returned when a string is not a valid `DD/MM/YYYY` date
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDayParseError(pub String);

impl fmt::Display for CalendarDayParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid calendar day '{}', expected DD/MM/YYYY", self.0)
    }
}

impl std::error::Error for CalendarDayParseError {}

impl FromStr for CalendarDay {
    type Err = CalendarDayParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), DAY_FORMAT)
            .map(Self)
            .map_err(|_| CalendarDayParseError(s.to_string()))
    }
}

impl TryFrom<String> for CalendarDay {
    type Error = CalendarDayParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CalendarDay> for String {
    fn from(day: CalendarDay) -> Self {
        day.to_string()
    }
}
