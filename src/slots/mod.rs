//! Slot arithmetic for the booking calendar
//!
//! Pure helpers shared by the schedule resolver, the availability calculator
//! and the booking path: time-of-day parsing/normalization and expansion of
//! working-hours rules into candidate slots.

pub mod clock;
pub mod expand;

use chrono::{Datelike, NaiveDate};

use crate::error::{AppError, AppResult};

pub use clock::TimeOfDay;
pub use expand::{expand_rules, expand_window, fallback_template};

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date '{}' (use YYYY-MM-DD)", raw)))
}

/// Day of week as stored in working-hours rules (0=Sunday, 6=Saturday)
pub fn day_of_week(date: NaiveDate) -> i16 {
    date.weekday().num_days_from_sunday() as i16
}
