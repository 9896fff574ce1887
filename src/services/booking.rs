//! Booking transactor
//!
//! A booking attempt moves through `Validating` then `Reserving` and ends
//! `Committed` or `Rejected`. At most one occupying appointment may exist per
//! (barber, date, time); the partial unique index on `appointments` is the
//! authority for that, the pre-check and race re-read below only shorten the
//! path to a clean conflict.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use uuid::Uuid;

use super::{cache::AvailabilityCache, retry::RetryPolicy, schedule::ScheduleResolver};
use crate::{
    config::BookingConfig,
    error::{AppError, AppResult},
    models::{
        appointment::{Appointment, AppointmentStatus, BookAppointment, NewAppointment},
        parse_id,
    },
    repository::{AppointmentStore, CatalogStore},
    slots::{self, TimeOfDay},
};

/// Phase of a single booking attempt, recorded in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingPhase {
    Validating,
    Reserving,
    Committed,
    Rejected,
}

impl fmt::Display for BookingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingPhase::Validating => "validating",
            BookingPhase::Reserving => "reserving",
            BookingPhase::Committed => "committed",
            BookingPhase::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
pub struct BookingService {
    resolver: ScheduleResolver,
    appointments: Arc<dyn AppointmentStore>,
    catalog: Arc<dyn CatalogStore>,
    cache: Arc<dyn AvailabilityCache>,
    retry: RetryPolicy,
    write_timeout: Duration,
    use_procedure: bool,
    max_days_ahead: Option<u32>,
}

impl BookingService {
    pub fn new(
        resolver: ScheduleResolver,
        appointments: Arc<dyn AppointmentStore>,
        catalog: Arc<dyn CatalogStore>,
        cache: Arc<dyn AvailabilityCache>,
        config: &BookingConfig,
    ) -> Self {
        Self {
            resolver,
            appointments,
            catalog,
            cache,
            retry: RetryPolicy::from_config(config),
            write_timeout: config.write_timeout(),
            use_procedure: config.use_procedures,
            max_days_ahead: config.max_days_ahead,
        }
    }

    /// Reserve a slot; `SlotConflict` when someone else holds it
    #[tracing::instrument(
        skip(self, request),
        fields(
            barber_id = tracing::field::Empty,
            date = tracing::field::Empty,
            time = tracing::field::Empty
        )
    )]
    pub async fn book(&self, request: BookAppointment) -> AppResult<Appointment> {
        tracing::debug!(phase = %BookingPhase::Validating);
        let new = match self.validate(&request).await {
            Ok(new) => new,
            Err(e) => {
                tracing::info!(phase = %BookingPhase::Rejected, error = %e, "Booking request refused");
                return Err(e);
            }
        };

        let span = tracing::Span::current();
        span.record("barber_id", tracing::field::display(new.barber_id));
        span.record("date", tracing::field::display(new.date));
        span.record("time", tracing::field::display(new.time));

        tracing::debug!(phase = %BookingPhase::Reserving);
        let result = self.reserve(&new).await;

        match &result {
            Ok(appointment) => {
                tracing::info!(phase = %BookingPhase::Committed, appointment_id = %appointment.id, "Appointment booked");
            }
            Err(e) => {
                tracing::info!(phase = %BookingPhase::Rejected, error = %e, "Booking failed");
            }
        }

        // a conflict means cached availability showed a taken slot as free
        if matches!(result, Ok(_) | Err(AppError::SlotConflict(_) | AppError::AmbiguousOutcome(_))) {
            self.invalidate(new.barber_id, new.date).await;
        }
        result
    }

    /// Cancel a scheduled appointment, freeing its slot
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: Uuid) -> AppResult<Appointment> {
        let appointment = self.get(id).await?;
        if appointment.status == AppointmentStatus::Canceled {
            return Err(AppError::BusinessRule("Appointment is already canceled".to_string()));
        }

        let result = self
            .write("appointments.cancel", || {
                self.appointments.set_status(id, AppointmentStatus::Canceled)
            })
            .await;

        if matches!(result, Ok(_) | Err(AppError::AmbiguousOutcome(_))) {
            self.invalidate(appointment.barber_id, appointment.date).await;
        }
        let canceled = result?;
        tracing::info!(appointment_id = %id, "Appointment canceled");
        Ok(canceled)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Appointment> {
        self.retry.run("appointments.get", || self.appointments.get(id)).await
    }

    pub async fn list_for_client(&self, client_id: Uuid, include_canceled: bool) -> AppResult<Vec<Appointment>> {
        self.retry
            .run("appointments.list_for_client", || {
                self.appointments.list_for_client(client_id, include_canceled)
            })
            .await
    }

    pub async fn list_for_barber(&self, barber_id: Uuid, date: &str) -> AppResult<Vec<Appointment>> {
        let date = slots::parse_date(date)?;
        self.retry
            .run("appointments.list_for_barber", || self.appointments.list_for_barber(barber_id, date))
            .await
    }

    async fn validate(&self, request: &BookAppointment) -> AppResult<NewAppointment> {
        let client_id = parse_id("client_id", request.client_id.as_deref())?;
        let barber_id = parse_id("barber_id", request.barber_id.as_deref())?;
        let service_id = match request.service_id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_id("service_id", Some(raw))?),
            _ => None,
        };

        let date = request
            .date
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Validation("date is required".to_string()))
            .and_then(slots::parse_date)?;
        let raw_time = request
            .time
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Validation("time is required".to_string()))?;
        let time = TimeOfDay::parse(raw_time)
            .map_err(|e| AppError::Validation(format!("Invalid time '{}': {}", raw_time, e)))?;

        self.check_bookable_date(date, time)?;

        let barber = self
            .retry
            .run("catalog.barber", || self.catalog.barber(barber_id))
            .await?
            .filter(|b| b.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Barber {} not found", barber_id)))?;

        let price = match service_id {
            Some(id) => Some(
                self.retry
                    .run("catalog.service_price", || self.catalog.service_price(id))
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Service {} not found", id)))?,
            ),
            None => None,
        };

        let schedule = self.resolver.resolve(barber.id, date).await?;
        if !schedule.slots.contains(&time) {
            return Err(AppError::BusinessRule(format!(
                "{} is not an offered slot for this barber on {}",
                time, date
            )));
        }

        Ok(NewAppointment {
            client_id,
            barber_id: barber.id,
            service_id,
            date,
            time,
            price,
        })
    }

    fn check_bookable_date(&self, date: NaiveDate, time: TimeOfDay) -> AppResult<()> {
        let now = Local::now().naive_local();
        let today = now.date();

        if date < today || (date == today && time.to_naive() <= now.time()) {
            return Err(AppError::BusinessRule("Cannot book a slot in the past".to_string()));
        }
        if let Some(days) = self.max_days_ahead {
            if (date - today).num_days() > i64::from(days) {
                return Err(AppError::BusinessRule(format!(
                    "Bookings are open at most {} days ahead",
                    days
                )));
            }
        }
        Ok(())
    }

    async fn reserve(&self, new: &NewAppointment) -> AppResult<Appointment> {
        if self.use_procedure {
            let booked = self
                .write("appointments.book_atomic", || self.appointments.book_atomic(new))
                .await?;
            if let Some(appointment) = booked {
                return Ok(appointment);
            }
            tracing::debug!("create_appointment procedure unavailable, using guarded insert");
        }
        self.check_then_insert(new).await
    }

    /// Insert guarded by a pre-check and a race re-read. The earliest
    /// occupying row (by creation time) keeps the slot; a later one cancels
    /// itself.
    async fn check_then_insert(&self, new: &NewAppointment) -> AppResult<Appointment> {
        let holders = self.occupying(new).await?;
        if !holders.is_empty() {
            return Err(AppError::SlotConflict(new.slot_label()));
        }

        let created = self
            .write("appointments.insert", || self.appointments.insert(new))
            .await?;

        let holders = self.occupying(new).await.map_err(|e| {
            AppError::AmbiguousOutcome(format!(
                "appointment {} was inserted but the slot could not be re-checked: {}",
                created.id, e
            ))
        })?;

        match holders.first() {
            Some(winner) if winner.id != created.id => {
                tracing::warn!(
                    appointment_id = %created.id,
                    winner_id = %winner.id,
                    "Lost booking race, rolling back"
                );
                self.write("appointments.rollback", || {
                    self.appointments.set_status(created.id, AppointmentStatus::Canceled)
                })
                .await
                .map_err(|e| {
                    AppError::AmbiguousOutcome(format!(
                        "appointment {} lost a booking race and could not be rolled back: {}",
                        created.id, e
                    ))
                })?;
                Err(AppError::SlotConflict(new.slot_label()))
            }
            _ => Ok(created),
        }
    }

    async fn occupying(&self, new: &NewAppointment) -> AppResult<Vec<Appointment>> {
        self.retry
            .run("appointments.find_occupying", || {
                self.appointments.find_occupying(new.barber_id, new.date, new.time)
            })
            .await
    }

    /// Run a write under the write timeout. Exceeding it leaves the commit
    /// state unknown, so it is never retried.
    async fn write<T, F, Fut>(&self, operation: &str, mut op: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let timeout = self.write_timeout;
        self.retry
            .run(operation, || {
                let attempt = op();
                async move {
                    match tokio::time::timeout(timeout, attempt).await {
                        Ok(result) => result,
                        Err(_) => Err(AppError::AmbiguousOutcome(format!(
                            "{} did not complete within {} ms",
                            operation,
                            timeout.as_millis()
                        ))),
                    }
                }
            })
            .await
    }

    async fn invalidate(&self, barber_id: Uuid, date: NaiveDate) {
        if let Err(e) = self.cache.invalidate(barber_id, date).await {
            tracing::warn!(%barber_id, %date, error = %e, "Failed to invalidate cached availability");
        }
    }
}
