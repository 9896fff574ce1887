//! Appointment model and related types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppError;
use crate::slots::TimeOfDay;

/// Appointment status
///
/// Only `scheduled` and `canceled` are ever written. Any stored status other
/// than `canceled` keeps holding the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Canceled,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Canceled => "canceled",
        }
    }

    /// Whether an appointment in this status holds its slot
    pub fn is_occupying(self) -> bool {
        !matches!(self, AppointmentStatus::Canceled)
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "canceled" => Ok(AppointmentStatus::Canceled),
            other => Err(AppError::Internal(format!("Unknown appointment status '{}'", other))),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A booking of one barber's time by one client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub barber_id: Uuid,
    pub service_id: Option<Uuid>,
    pub date: NaiveDate,
    /// Start time (HH:MM)
    #[schema(value_type = String, example = "09:30")]
    pub time: TimeOfDay,
    pub status: AppointmentStatus,
    /// Service price at booking time
    pub price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Row as stored in `appointments`
#[derive(Debug, Clone, FromRow)]
pub struct AppointmentRow {
    pub id: Uuid,
    pub client_id: Uuid,
    pub barber_id: Uuid,
    pub service_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: String,
    pub price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = AppError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            client_id: row.client_id,
            barber_id: row.barber_id,
            service_id: row.service_id,
            date: row.date,
            time: row.time.into(),
            status: row.status.parse()?,
            price: row.price,
            created_at: row.created_at,
        })
    }
}

/// Raw booking request; every field is checked by the booking service
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookAppointment {
    /// Client ID; defaults to the caller for client accounts
    pub client_id: Option<String>,
    pub barber_id: Option<String>,
    pub service_id: Option<String>,
    /// Date (YYYY-MM-DD)
    pub date: Option<String>,
    /// Time (HH:MM)
    pub time: Option<String>,
}

/// A validated booking ready to be reserved
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub client_id: Uuid,
    pub barber_id: Uuid,
    pub service_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub price: Option<Decimal>,
}

impl NewAppointment {
    /// Human-readable slot key for logs and conflict details
    pub fn slot_label(&self) -> String {
        format!("barber {} on {} at {}", self.barber_id, self.date, self.time)
    }
}

/// Query parameters for a barber's appointments
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BarberAppointmentsQuery {
    /// Date (YYYY-MM-DD)
    pub date: String,
}

/// Query parameters for the caller's appointments
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct MyAppointmentsQuery {
    /// Include canceled appointments
    #[serde(default)]
    pub include_canceled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip_and_occupancy() {
        assert_eq!("scheduled".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Scheduled);
        assert_eq!(AppointmentStatus::Canceled.to_string(), "canceled");
        assert!(AppointmentStatus::Scheduled.is_occupying());
        assert!(!AppointmentStatus::Canceled.is_occupying());
        assert!("confirmed".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_row_conversion_drops_seconds() {
        let row = AppointmentRow {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            barber_id: Uuid::new_v4(),
            service_id: None,
            date: NaiveDate::from_ymd_opt(2030, 1, 7).unwrap(),
            time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            status: "scheduled".to_string(),
            price: Some(Decimal::new(3500, 2)),
            created_at: Utc::now(),
        };
        let appointment = Appointment::try_from(row).unwrap();
        assert_eq!(appointment.time.to_string(), "14:00");
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);

        let json = serde_json::to_value(&appointment).unwrap();
        assert_eq!(json["time"], "14:00");
        assert_eq!(json["status"], "scheduled");
    }
}
