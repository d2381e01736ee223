//! Calendar-day keys.
//!
//! Every completion and journal lookup is indexed by a [`DayKey`], the
//! `YYYY-MM-DD` calendar day in the viewer's local time. Distances between
//! keys are counted in calendar days, never in elapsed time, so a 23 or 25
//! hour day around a DST switch still counts as exactly one day.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Calendar day containing `instant`, in the instant's own offset.
    pub fn from_instant<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self(instant.date_naive())
    }

    /// Strict `YYYY-MM-DD` parse: four-digit year, two-digit month and day,
    /// and a date that exists on the calendar.
    pub fn parse(s: &str) -> Result<Self, TrackerError> {
        let invalid = || TrackerError::InvalidDayKey(s.to_string());
        let bytes = s.as_bytes();
        if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
            return Err(invalid());
        }
        let digits_ok = bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        if !digits_ok {
            return Err(invalid());
        }

        let year = s[0..4].parse::<i32>().map_err(|_| invalid())?;
        let month = s[5..7].parse::<u32>().map_err(|_| invalid())?;
        let day = s[8..10].parse::<u32>().map_err(|_| invalid())?;
        Self::from_ymd(year, month, day).ok_or_else(invalid)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// 1-based day of the year.
    pub fn ordinal(&self) -> u32 {
        self.0.ordinal()
    }

    pub fn pred(&self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }

    pub fn succ(&self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    /// Key `days` calendar days away (negative goes back).
    pub fn offset(&self, days: i64) -> Option<Self> {
        let delta = chrono::Duration::try_days(days)?;
        self.0.checked_add_signed(delta).map(Self)
    }

    pub fn is_after(&self, other: DayKey) -> bool {
        self.0 > other.0
    }

    /// True iff this day is strictly after the calendar day of `reference`.
    pub fn is_future<Tz: TimeZone>(&self, reference: &DateTime<Tz>) -> bool {
        self.is_after(Self::from_instant(reference))
    }
}

/// Signed number of calendar days from `a` to `b` (`b - a`).
pub fn days_between(a: DayKey, b: DayKey) -> i64 {
    b.0.signed_duration_since(a.0).num_days()
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DayKey {
    type Error = TrackerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DayKey> for String {
    fn from(key: DayKey) -> Self {
        key.to_string()
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn key(s: &str) -> DayKey {
        DayKey::parse(s).unwrap()
    }

    #[test]
    fn formats_zero_padded() {
        let k = DayKey::from_ymd(2024, 3, 5).unwrap();
        assert_eq!(k.to_string(), "2024-03-05");
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        for bad in ["2024-3-05", "2024-03-5", "24-03-05", "2024/03/05", "2024-02-30", "", "+024-03-05", "2024-03-05 "] {
            assert!(matches!(DayKey::parse(bad), Err(TrackerError::InvalidDayKey(_))), "{bad}");
        }
        assert_eq!(key("2024-02-29").day(), 29);
    }

    #[test]
    fn from_instant_uses_local_offset() {
        // 23:30 on Jan 1 in UTC-05:00 is already Jan 2 in UTC.
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let instant = tz.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();
        assert_eq!(DayKey::from_instant(&instant), key("2024-01-01"));
        assert_eq!(DayKey::from_instant(&instant.with_timezone(&chrono::Utc)), key("2024-01-02"));
    }

    #[test]
    fn days_between_is_calendar_based() {
        assert_eq!(days_between(key("2024-03-09"), key("2024-03-11")), 2);
        assert_eq!(days_between(key("2024-03-11"), key("2024-03-09")), -2);
        assert_eq!(days_between(key("2023-12-31"), key("2024-01-01")), 1);
        assert_eq!(days_between(key("2024-02-28"), key("2024-03-01")), 2);
    }

    #[test]
    fn future_check_is_strictly_after() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let now = tz.with_ymd_and_hms(2024, 1, 7, 12, 0, 0).unwrap();
        assert!(!key("2024-01-07").is_future(&now));
        assert!(!key("2024-01-06").is_future(&now));
        assert!(key("2024-01-08").is_future(&now));
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&key("2024-01-07")).unwrap();
        assert_eq!(json, "\"2024-01-07\"");
        let back: DayKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key("2024-01-07"));
        assert!(serde_json::from_str::<DayKey>("\"2024-13-01\"").is_err());
    }
}
