//! Data models for the booking server

pub mod appointment;
pub mod barber;
pub mod slot;
pub mod user;
pub mod working_hours;

use uuid::Uuid;

use crate::error::{AppError, AppResult};

// Re-export commonly used types
pub use appointment::{Appointment, AppointmentStatus, BookAppointment, NewAppointment};
pub use barber::Barber;
pub use slot::SlotAvailability;
pub use user::{Role, UserClaims};
pub use working_hours::{RuleScope, ScheduleSource, WorkingHoursRule};

/// Parse a required identifier field from raw input
pub fn parse_id(field: &str, raw: Option<&str>) -> AppResult<Uuid> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} is required", field)))?;
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("Invalid {} '{}'", field, raw)))
}
