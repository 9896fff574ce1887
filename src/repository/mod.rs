//! Repository layer for database operations
//!
//! The booking core only sees the store traits below; the Postgres
//! repositories implement them, tests substitute mocks or the in-memory store.

pub mod appointments;
pub mod barbers;
#[cfg(test)]
pub mod memory;
pub mod working_hours;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        appointment::{Appointment, AppointmentStatus, NewAppointment},
        barber::Barber,
        slot::SlotAvailability,
        working_hours::{RuleScope, RuleWindow, WorkingHoursRule},
    },
    slots::TimeOfDay,
};

/// Read access to working-hours configuration
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkingHoursStore: Send + Sync {
    /// Active rules of one scope for one day of week (0=Sunday)
    async fn active_rules(&self, scope: RuleScope, day_of_week: i16) -> AppResult<Vec<WorkingHoursRule>>;
}

/// Rule management behind the working-hours admin endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkingHoursAdminStore: Send + Sync {
    /// Rules of a scope, ordered by day and start time
    async fn list(&self, scope: RuleScope, include_inactive: bool) -> AppResult<Vec<WorkingHoursRule>>;

    async fn get(&self, id: Uuid) -> AppResult<WorkingHoursRule>;

    /// Create one active rule
    async fn create(&self, scope: RuleScope, day_of_week: i16, window: &RuleWindow) -> AppResult<WorkingHoursRule>;

    /// Deactivate the active rules of (scope, day) and insert `windows`, all or nothing
    async fn replace(&self, scope: RuleScope, day_of_week: i16, windows: &[RuleWindow]) -> AppResult<Vec<WorkingHoursRule>>;

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<WorkingHoursRule>;
}

/// Appointment persistence as seen by availability and booking
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Start times of occupying appointments, as stored (`HH:MM` or `HH:MM:SS`)
    async fn occupied_times(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<Vec<String>>;

    /// Occupying appointments holding one exact slot, oldest first
    async fn find_occupying(&self, barber_id: Uuid, date: NaiveDate, time: TimeOfDay) -> AppResult<Vec<Appointment>>;

    /// Insert a `scheduled` appointment
    async fn insert(&self, appointment: &NewAppointment) -> AppResult<Appointment>;

    async fn set_status(&self, id: Uuid, status: AppointmentStatus) -> AppResult<Appointment>;

    async fn get(&self, id: Uuid) -> AppResult<Appointment>;

    async fn list_for_client(&self, client_id: Uuid, include_canceled: bool) -> AppResult<Vec<Appointment>>;

    async fn list_for_barber(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<Vec<Appointment>>;

    /// Server-side availability, `None` when the procedure is not installed
    async fn availability_procedure(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<Option<Vec<SlotAvailability>>>;

    /// Server-side check-and-insert, `None` when the procedure is not installed
    async fn book_atomic(&self, appointment: &NewAppointment) -> AppResult<Option<Appointment>>;
}

/// Lookups of the records a booking refers to
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn barber(&self, id: Uuid) -> AppResult<Option<Barber>>;

    /// Current price of a service, `None` when the service does not exist
    async fn service_price(&self, id: Uuid) -> AppResult<Option<Decimal>>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub appointments: appointments::AppointmentsRepository,
    pub barbers: barbers::BarbersRepository,
    pub working_hours: working_hours::WorkingHoursRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            appointments: appointments::AppointmentsRepository::new(pool.clone()),
            barbers: barbers::BarbersRepository::new(pool.clone()),
            working_hours: working_hours::WorkingHoursRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
