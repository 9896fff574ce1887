//! Time-of-day values in minutes since midnight
//!
//! Stored times come back either as `HH:MM` or `HH:MM:SS` depending on the
//! path (table column, procedure output, client input). Everything is reduced
//! to minute granularity before comparison.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Time of day with minute precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid time of day '{0}' (use HH:MM)")]
pub struct InvalidTime(pub String);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(TimeOfDay(minutes))
    }

    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(TimeOfDay(hour * 60 + minute))
        } else {
            None
        }
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }

    /// Parse `HH:MM` or `HH:MM:SS[.fff]`; seconds are dropped
    pub fn parse(raw: &str) -> Result<Self, InvalidTime> {
        let invalid = || InvalidTime(raw.to_string());
        let mut parts = raw.trim().split(':');

        let hour = parts.next().and_then(parse_two_digits).ok_or_else(invalid)?;
        let minute = parts.next().and_then(parse_two_digits).ok_or_else(invalid)?;
        if let Some(seconds) = parts.next() {
            let whole = seconds.split('.').next().unwrap_or_default();
            match parse_two_digits(whole) {
                Some(s) if s < 60 => {}
                _ => return Err(invalid()),
            }
        }
        if parts.next().is_some() {
            return Err(invalid());
        }

        Self::from_hm(hour, minute).ok_or_else(invalid)
    }

    /// Step forward by `minutes`, `None` past midnight
    pub fn checked_add(self, minutes: u16) -> Option<Self> {
        self.0.checked_add(minutes).and_then(Self::from_minutes)
    }

    pub fn to_naive(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour() as u32, self.minute() as u32, 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

fn parse_two_digits(part: &str) -> Option<u16> {
    if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Reduce a stored time (`HH:MM` or `HH:MM:SS`) to canonical `HH:MM`
pub fn normalize_time(raw: &str) -> Option<String> {
    TimeOfDay::parse(raw).ok().map(|t| t.to_string())
}

impl From<NaiveTime> for TimeOfDay {
    fn from(t: NaiveTime) -> Self {
        TimeOfDay((t.hour() * 60 + t.minute()) as u16)
    }
}

impl From<TimeOfDay> for NaiveTime {
    fn from(t: TimeOfDay) -> Self {
        t.to_naive()
    }
}

impl FromStr for TimeOfDay {
    type Err = InvalidTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TimeOfDay::parse(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_minutes_and_seconds() {
        assert_eq!(TimeOfDay::parse("14:00"), Ok(TimeOfDay::from_hm(14, 0).unwrap()));
        assert_eq!(TimeOfDay::parse("14:00:00"), Ok(TimeOfDay::from_hm(14, 0).unwrap()));
        assert_eq!(TimeOfDay::parse("08:30:00.000"), Ok(TimeOfDay::from_hm(8, 30).unwrap()));
        assert_eq!(TimeOfDay::parse(" 9:05 "), Ok(TimeOfDay::from_hm(9, 5).unwrap()));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for raw in ["", "14", "24:00", "12:60", "12:00:61", "ab:cd", "12:00:00:00", "123:00", "-1:00"] {
            assert!(TimeOfDay::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_normalize_strips_seconds() {
        assert_eq!(normalize_time("14:00:00").as_deref(), Some("14:00"));
        assert_eq!(normalize_time("7:30").as_deref(), Some("07:30"));
        assert_eq!(normalize_time("nope"), None);
    }

    #[test]
    fn test_ordering_is_chronological() {
        // string comparison would put "9:00" after "10:00"
        let nine = TimeOfDay::parse("9:00").unwrap();
        let ten = TimeOfDay::parse("10:00").unwrap();
        assert!(nine < ten);
    }

    #[test]
    fn test_checked_add_stops_at_midnight() {
        let late = TimeOfDay::from_hm(23, 30).unwrap();
        assert_eq!(late.checked_add(15), TimeOfDay::from_hm(23, 45));
        assert_eq!(late.checked_add(30), None);
    }

    #[test]
    fn test_naive_time_conversion_drops_seconds() {
        let t = NaiveTime::from_hms_opt(14, 0, 59).unwrap();
        assert_eq!(TimeOfDay::from(t).to_string(), "14:00");
        assert_eq!(TimeOfDay::from_hm(9, 15).unwrap().to_naive(), NaiveTime::from_hms_opt(9, 15, 0).unwrap());
    }

    #[test]
    fn test_serde_as_string() {
        let t = TimeOfDay::from_hm(8, 0).unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"08:00\"");
        let back: TimeOfDay = serde_json::from_str("\"08:00:00\"").unwrap();
        assert_eq!(back, t);
        assert!(serde_json::from_str::<TimeOfDay>("\"25:00\"").is_err());
    }
}
