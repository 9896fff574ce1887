//! Appointments repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::AppointmentStore;
use crate::{
    error::{sqlstate, AppError, AppResult},
    models::{
        appointment::{Appointment, AppointmentRow, AppointmentStatus, NewAppointment},
        slot::SlotAvailability,
    },
    slots::TimeOfDay,
};

const APPOINTMENT_COLUMNS: &str =
    "id, client_id, barber_id, service_id, date, time, status, price, created_at";

#[derive(Clone)]
pub struct AppointmentsRepository {
    pool: Pool<Postgres>,
}

impl AppointmentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn rows_to_appointments(rows: Vec<AppointmentRow>) -> AppResult<Vec<Appointment>> {
        rows.into_iter().map(Appointment::try_from).collect()
    }
}

fn sql_state(e: &sqlx::Error) -> Option<String> {
    match e {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// Classify a failed booking write
fn booking_write_error(e: sqlx::Error, appointment: &NewAppointment) -> AppError {
    match sql_state(&e).as_deref() {
        Some(sqlstate::UNIQUE_VIOLATION) | Some(sqlstate::SLOT_OCCUPIED) => {
            AppError::SlotConflict(appointment.slot_label())
        }
        _ => AppError::from_write(e),
    }
}

#[async_trait]
impl AppointmentStore for AppointmentsRepository {
    async fn occupied_times(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<Vec<String>> {
        let rows = sqlx::query_scalar::<_, String>(
            r#"
            SELECT time::text
            FROM appointments
            WHERE barber_id = $1 AND date = $2 AND status <> 'canceled'
            ORDER BY time
            "#,
        )
        .bind(barber_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_occupying(&self, barber_id: Uuid, date: NaiveDate, time: TimeOfDay) -> AppResult<Vec<Appointment>> {
        let query = format!(
            "SELECT {} FROM appointments \
             WHERE barber_id = $1 AND date = $2 AND time = $3 AND status <> 'canceled' \
             ORDER BY created_at, id",
            APPOINTMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AppointmentRow>(&query)
            .bind(barber_id)
            .bind(date)
            .bind(time.to_naive())
            .fetch_all(&self.pool)
            .await?;
        Self::rows_to_appointments(rows)
    }

    async fn insert(&self, appointment: &NewAppointment) -> AppResult<Appointment> {
        let query = format!(
            r#"
            INSERT INTO appointments (client_id, barber_id, service_id, date, time, status, price)
            VALUES ($1, $2, $3, $4, $5, 'scheduled', $6)
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, AppointmentRow>(&query)
            .bind(appointment.client_id)
            .bind(appointment.barber_id)
            .bind(appointment.service_id)
            .bind(appointment.date)
            .bind(appointment.time.to_naive())
            .bind(appointment.price)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| booking_write_error(e, appointment))?;
        row.try_into()
    }

    async fn set_status(&self, id: Uuid, status: AppointmentStatus) -> AppResult<Appointment> {
        let query = format!(
            "UPDATE appointments SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            APPOINTMENT_COLUMNS
        );
        sqlx::query_as::<_, AppointmentRow>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_write)?
            .ok_or_else(|| AppError::NotFound(format!("Appointment {} not found", id)))?
            .try_into()
    }

    async fn get(&self, id: Uuid) -> AppResult<Appointment> {
        let query = format!("SELECT {} FROM appointments WHERE id = $1", APPOINTMENT_COLUMNS);
        sqlx::query_as::<_, AppointmentRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Appointment {} not found", id)))?
            .try_into()
    }

    async fn list_for_client(&self, client_id: Uuid, include_canceled: bool) -> AppResult<Vec<Appointment>> {
        let query = format!(
            "SELECT {} FROM appointments \
             WHERE client_id = $1 AND ($2 OR status <> 'canceled') \
             ORDER BY date DESC, time DESC",
            APPOINTMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AppointmentRow>(&query)
            .bind(client_id)
            .bind(include_canceled)
            .fetch_all(&self.pool)
            .await?;
        Self::rows_to_appointments(rows)
    }

    async fn list_for_barber(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<Vec<Appointment>> {
        let query = format!(
            "SELECT {} FROM appointments WHERE barber_id = $1 AND date = $2 ORDER BY time, created_at",
            APPOINTMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AppointmentRow>(&query)
            .bind(barber_id)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;
        Self::rows_to_appointments(rows)
    }

    async fn availability_procedure(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<Option<Vec<SlotAvailability>>> {
        let result = sqlx::query_as::<_, (String, bool)>(
            "SELECT slot_time::text, is_available FROM get_available_slots($1, $2)",
        )
        .bind(barber_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await;

        match result {
            Ok(rows) => Ok(Some(
                rows.into_iter()
                    .map(|(time, is_available)| SlotAvailability { time, is_available })
                    .collect(),
            )),
            Err(e) if sql_state(&e).as_deref() == Some(sqlstate::UNDEFINED_FUNCTION) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn book_atomic(&self, appointment: &NewAppointment) -> AppResult<Option<Appointment>> {
        let query = format!(
            "SELECT {} FROM create_appointment($1, $2, $3, $4, $5, 'scheduled')",
            APPOINTMENT_COLUMNS
        );
        let result = sqlx::query_as::<_, AppointmentRow>(&query)
            .bind(appointment.client_id)
            .bind(appointment.barber_id)
            .bind(appointment.service_id)
            .bind(appointment.date)
            .bind(appointment.time.to_naive())
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => Ok(Some(row.try_into()?)),
            Err(e) if sql_state(&e).as_deref() == Some(sqlstate::UNDEFINED_FUNCTION) => Ok(None),
            Err(e) => Err(booking_write_error(e, appointment)),
        }
    }
}
