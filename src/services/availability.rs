//! Availability calculation: candidate slots marked free or occupied
//!
//! The server-side `get_available_slots` procedure is tried first when enabled.
//! Any failure or timeout on that path falls back to computing availability
//! from the resolved schedule and the occupied times, which yields the same
//! answer. Failures of the fallback path itself are returned to the caller.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use uuid::Uuid;

use super::{cache::AvailabilityCache, retry::RetryPolicy, schedule::ScheduleResolver};
use crate::{
    config::BookingConfig,
    error::AppResult,
    models::slot::SlotAvailability,
    repository::AppointmentStore,
    slots::{self, TimeOfDay},
};

#[derive(Clone)]
pub struct AvailabilityService {
    resolver: ScheduleResolver,
    appointments: Arc<dyn AppointmentStore>,
    cache: Arc<dyn AvailabilityCache>,
    retry: RetryPolicy,
    procedure_timeout: Duration,
    use_procedure: bool,
}

impl AvailabilityService {
    pub fn new(
        resolver: ScheduleResolver,
        appointments: Arc<dyn AppointmentStore>,
        cache: Arc<dyn AvailabilityCache>,
        config: &BookingConfig,
    ) -> Self {
        Self {
            resolver,
            appointments,
            cache,
            retry: RetryPolicy::from_config(config),
            procedure_timeout: config.availability_timeout(),
            use_procedure: config.use_procedures,
        }
    }

    /// Availability of a barber on a `YYYY-MM-DD` date
    pub async fn get_availability(&self, barber_id: Uuid, date: &str) -> AppResult<Vec<SlotAvailability>> {
        let date = slots::parse_date(date)?;
        self.availability_for(barber_id, date).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn availability_for(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<Vec<SlotAvailability>> {
        match self.cache.get(barber_id, date).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Availability cache read failed"),
        }

        // taken before reading appointments, so a booking committed meanwhile refuses our put
        let generation = match self.cache.generation(barber_id, date).await {
            Ok(generation) => Some(generation),
            Err(e) => {
                tracing::warn!(error = %e, "Availability cache generation read failed");
                None
            }
        };

        let computed = match self.from_procedure(barber_id, date).await {
            Some(slots) => slots,
            None => self.compute(barber_id, date).await?,
        };

        if let Some(seen) = generation {
            match self.cache.put(barber_id, date, seen, &computed).await {
                Ok(true) => {}
                Ok(false) => tracing::debug!("Availability changed while computing, not cached"),
                Err(e) => tracing::warn!(error = %e, "Availability cache write failed"),
            }
        }
        Ok(computed)
    }

    /// Availability computed from the resolved schedule and occupied times
    pub async fn compute(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<Vec<SlotAvailability>> {
        let schedule = self.resolver.resolve(barber_id, date).await?;
        if schedule.slots.is_empty() {
            return Ok(Vec::new());
        }

        let stored = self
            .retry
            .run("appointments.occupied_times", || self.appointments.occupied_times(barber_id, date))
            .await?;

        let occupied: HashSet<TimeOfDay> = stored
            .iter()
            .filter_map(|raw| match TimeOfDay::parse(raw) {
                Ok(t) => Some(t),
                Err(e) => {
                    tracing::warn!(raw = %raw, error = %e, "Ignoring unparsable appointment time");
                    None
                }
            })
            .collect();

        Ok(mark_occupied(&schedule.slots, &occupied))
    }

    /// Ask the database procedure; `None` means "compute it here instead"
    async fn from_procedure(&self, barber_id: Uuid, date: NaiveDate) -> Option<Vec<SlotAvailability>> {
        if !self.use_procedure {
            return None;
        }

        let result = tokio::time::timeout(
            self.procedure_timeout,
            self.appointments.availability_procedure(barber_id, date),
        )
        .await;

        match result {
            Ok(Ok(Some(rows))) => Some(normalize_procedure_rows(rows)),
            Ok(Ok(None)) => None,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Availability procedure failed, computing locally");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.procedure_timeout.as_millis() as u64,
                    "Availability procedure timed out, computing locally"
                );
                None
            }
        }
    }
}

/// Pair every candidate slot with whether it is still free
pub fn mark_occupied(candidates: &[TimeOfDay], occupied: &HashSet<TimeOfDay>) -> Vec<SlotAvailability> {
    candidates
        .iter()
        .map(|slot| SlotAvailability {
            time: slot.to_string(),
            is_available: !occupied.contains(slot),
        })
        .collect()
}

/// Canonical `HH:MM`, ordered by time, one row per slot
fn normalize_procedure_rows(rows: Vec<SlotAvailability>) -> Vec<SlotAvailability> {
    let mut parsed: Vec<(TimeOfDay, bool)> = rows
        .into_iter()
        .filter_map(|row| match TimeOfDay::parse(&row.time) {
            Ok(t) => Some((t, row.is_available)),
            Err(e) => {
                tracing::warn!(raw = %row.time, error = %e, "Dropping unparsable procedure slot");
                None
            }
        })
        .collect();
    parsed.sort_by_key(|(t, _)| *t);
    // an occupied duplicate wins over a free one
    parsed.dedup_by(|next, kept| {
        if next.0 == kept.0 {
            kept.1 = kept.1 && next.1;
            true
        } else {
            false
        }
    });

    parsed
        .into_iter()
        .map(|(time, is_available)| SlotAvailability {
            time: time.to_string(),
            is_available,
        })
        .collect()
}
