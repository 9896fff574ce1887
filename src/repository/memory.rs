//! In-memory store for tests
//!
//! Mirrors the Postgres schema closely enough for the booking core: the
//! `enforce_unique` option plays the part of the partial unique index on
//! occupying appointments, and stored times keep whatever text they were
//! seeded with so seconds handling gets exercised.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Local, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{AppointmentStore, CatalogStore, WorkingHoursAdminStore, WorkingHoursStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        appointment::{Appointment, AppointmentStatus, NewAppointment},
        barber::Barber,
        slot::SlotAvailability,
        working_hours::{RuleScope, RuleWindow, WorkingHoursRule},
    },
    slots::{self, TimeOfDay},
};

/// A Monday one to two weeks ahead, so bookings on it are never in the past
pub fn upcoming_monday() -> NaiveDate {
    let mut date = Local::now().date_naive() + chrono::Duration::days(7);
    while date.weekday() != Weekday::Mon {
        date += chrono::Duration::days(1);
    }
    date
}

#[derive(Debug, Clone, Default)]
pub struct MemoryOptions {
    /// Reject a second occupying appointment for the same slot
    pub enforce_unique: bool,
    /// Answer `book_atomic` instead of reporting the procedure missing
    pub atomic_procedure: bool,
    /// Answer `availability_procedure`, optionally after a delay
    pub availability_procedure: Option<Duration>,
    /// Delay applied to every insert
    pub insert_delay: Option<Duration>,
    /// Delay between reading occupied times and returning them
    pub occupied_read_delay: Option<Duration>,
}

#[derive(Debug, Clone)]
struct StoredAppointment {
    appointment: Appointment,
    raw_time: String,
}

#[derive(Default)]
struct MemoryState {
    rules: Vec<WorkingHoursRule>,
    appointments: Vec<StoredAppointment>,
    barbers: HashMap<Uuid, Barber>,
    prices: HashMap<Uuid, Decimal>,
    last_created: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    options: MemoryOptions,
}

impl MemoryStore {
    pub fn new(options: MemoryOptions) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            options,
        }
    }

    /// Store that behaves like the migrated Postgres schema
    pub fn constrained() -> Self {
        Self::new(MemoryOptions {
            enforce_unique: true,
            ..Default::default()
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_barber(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().barbers.insert(
            id,
            Barber {
                id,
                name: name.to_string(),
                is_active: true,
                created_at: Some(Utc::now()),
            },
        );
        id
    }

    pub fn deactivate_barber(&self, id: Uuid) {
        if let Some(barber) = self.lock().barbers.get_mut(&id) {
            barber.is_active = false;
        }
    }

    pub fn add_service(&self, price: Decimal) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().prices.insert(id, price);
        id
    }

    pub fn add_rule(&self, scope: RuleScope, day_of_week: i16, start: &str, end: &str, interval: i32) -> Uuid {
        let window = RuleWindow {
            start_time: TimeOfDay::parse(start).expect("valid start"),
            end_time: TimeOfDay::parse(end).expect("valid end"),
            interval_minutes: interval,
        };
        let rule = Self::active_rule(scope, day_of_week, &window);
        let id = rule.id;
        self.lock().rules.push(rule);
        id
    }

    fn active_rule(scope: RuleScope, day_of_week: i16, window: &RuleWindow) -> WorkingHoursRule {
        WorkingHoursRule {
            id: Uuid::new_v4(),
            barber_id: scope.barber_id(),
            day_of_week,
            start_time: window.start_time,
            end_time: window.end_time,
            interval_minutes: window.interval_minutes,
            is_active: true,
            created_at: Some(Utc::now()),
        }
    }

    pub fn deactivate_rule(&self, id: Uuid) {
        if let Some(rule) = self.lock().rules.iter_mut().find(|r| r.id == id) {
            rule.is_active = false;
        }
    }

    /// Seed an appointment with the time text exactly as given
    pub fn seed_appointment(&self, barber_id: Uuid, date: NaiveDate, raw_time: &str, status: AppointmentStatus) -> Uuid {
        let mut state = self.lock();
        let created_at = Self::next_timestamp(&mut state);
        let appointment = Appointment {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            barber_id,
            service_id: None,
            date,
            time: TimeOfDay::parse(raw_time).expect("valid seed time"),
            status,
            price: None,
            created_at,
        };
        let id = appointment.id;
        state.appointments.push(StoredAppointment {
            appointment,
            raw_time: raw_time.to_string(),
        });
        id
    }

    /// Occupying appointments currently holding a slot
    pub fn occupying_count(&self, barber_id: Uuid, date: NaiveDate, time: TimeOfDay) -> usize {
        self.lock()
            .appointments
            .iter()
            .filter(|s| Self::holds(&s.appointment, barber_id, date, time))
            .count()
    }

    pub fn appointment_count(&self) -> usize {
        self.lock().appointments.len()
    }

    fn holds(a: &Appointment, barber_id: Uuid, date: NaiveDate, time: TimeOfDay) -> bool {
        a.barber_id == barber_id && a.date == date && a.time == time && a.status.is_occupying()
    }

    /// Strictly increasing creation timestamps, so insertion order is recoverable
    fn next_timestamp(state: &mut MemoryState) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match state.last_created {
            Some(last) if now <= last => last + chrono::Duration::microseconds(1),
            _ => now,
        };
        state.last_created = Some(next);
        next
    }

    fn push_scheduled(&self, new: &NewAppointment) -> AppResult<Appointment> {
        let mut state = self.lock();
        if self.options.enforce_unique
            && state
                .appointments
                .iter()
                .any(|s| Self::holds(&s.appointment, new.barber_id, new.date, new.time))
        {
            return Err(AppError::SlotConflict(new.slot_label()));
        }

        let created_at = Self::next_timestamp(&mut state);
        let appointment = Appointment {
            id: Uuid::new_v4(),
            client_id: new.client_id,
            barber_id: new.barber_id,
            service_id: new.service_id,
            date: new.date,
            time: new.time,
            status: AppointmentStatus::Scheduled,
            price: new.price,
            created_at,
        };
        state.appointments.push(StoredAppointment {
            appointment: appointment.clone(),
            raw_time: format!("{}:00", new.time),
        });
        Ok(appointment)
    }
}

#[async_trait]
impl WorkingHoursStore for MemoryStore {
    async fn active_rules(&self, scope: RuleScope, day_of_week: i16) -> AppResult<Vec<WorkingHoursRule>> {
        let mut rules: Vec<WorkingHoursRule> = self
            .lock()
            .rules
            .iter()
            .filter(|r| r.is_active && r.day_of_week == day_of_week && r.scope() == scope)
            .cloned()
            .collect();
        rules.sort_by_key(|r| r.start_time);
        Ok(rules)
    }
}

#[async_trait]
impl WorkingHoursAdminStore for MemoryStore {
    async fn list(&self, scope: RuleScope, include_inactive: bool) -> AppResult<Vec<WorkingHoursRule>> {
        let mut rules: Vec<WorkingHoursRule> = self
            .lock()
            .rules
            .iter()
            .filter(|r| r.scope() == scope && (include_inactive || r.is_active))
            .cloned()
            .collect();
        rules.sort_by_key(|r| (r.day_of_week, r.start_time));
        Ok(rules)
    }

    async fn get(&self, id: Uuid) -> AppResult<WorkingHoursRule> {
        self.lock()
            .rules
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Working-hours rule {} not found", id)))
    }

    async fn create(&self, scope: RuleScope, day_of_week: i16, window: &RuleWindow) -> AppResult<WorkingHoursRule> {
        let rule = Self::active_rule(scope, day_of_week, window);
        self.lock().rules.push(rule.clone());
        Ok(rule)
    }

    async fn replace(&self, scope: RuleScope, day_of_week: i16, windows: &[RuleWindow]) -> AppResult<Vec<WorkingHoursRule>> {
        let mut state = self.lock();
        for rule in state
            .rules
            .iter_mut()
            .filter(|r| r.scope() == scope && r.day_of_week == day_of_week)
        {
            rule.is_active = false;
        }
        let created: Vec<WorkingHoursRule> = windows
            .iter()
            .map(|w| Self::active_rule(scope, day_of_week, w))
            .collect();
        state.rules.extend(created.iter().cloned());
        Ok(created)
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<WorkingHoursRule> {
        let mut state = self.lock();
        let rule = state
            .rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Working-hours rule {} not found", id)))?;
        rule.is_active = is_active;
        Ok(rule.clone())
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn occupied_times(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<Vec<String>> {
        let times: Vec<String> = self
            .lock()
            .appointments
            .iter()
            .filter(|s| {
                s.appointment.barber_id == barber_id
                    && s.appointment.date == date
                    && s.appointment.status.is_occupying()
            })
            .map(|s| s.raw_time.clone())
            .collect();
        if let Some(delay) = self.options.occupied_read_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(times)
    }

    async fn find_occupying(&self, barber_id: Uuid, date: NaiveDate, time: TimeOfDay) -> AppResult<Vec<Appointment>> {
        let mut found: Vec<Appointment> = self
            .lock()
            .appointments
            .iter()
            .filter(|s| Self::holds(&s.appointment, barber_id, date, time))
            .map(|s| s.appointment.clone())
            .collect();
        found.sort_by_key(|a| (a.created_at, a.id));
        Ok(found)
    }

    async fn insert(&self, appointment: &NewAppointment) -> AppResult<Appointment> {
        match self.options.insert_delay {
            Some(delay) => tokio::time::sleep(delay).await,
            // let racing tasks interleave between check and insert
            None => tokio::task::yield_now().await,
        }
        self.push_scheduled(appointment)
    }

    async fn set_status(&self, id: Uuid, status: AppointmentStatus) -> AppResult<Appointment> {
        let mut state = self.lock();
        let stored = state
            .appointments
            .iter_mut()
            .find(|s| s.appointment.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Appointment {} not found", id)))?;
        stored.appointment.status = status;
        Ok(stored.appointment.clone())
    }

    async fn get(&self, id: Uuid) -> AppResult<Appointment> {
        self.lock()
            .appointments
            .iter()
            .find(|s| s.appointment.id == id)
            .map(|s| s.appointment.clone())
            .ok_or_else(|| AppError::NotFound(format!("Appointment {} not found", id)))
    }

    async fn list_for_client(&self, client_id: Uuid, include_canceled: bool) -> AppResult<Vec<Appointment>> {
        let mut found: Vec<Appointment> = self
            .lock()
            .appointments
            .iter()
            .map(|s| &s.appointment)
            .filter(|a| a.client_id == client_id && (include_canceled || a.status.is_occupying()))
            .cloned()
            .collect();
        found.sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time)));
        Ok(found)
    }

    async fn list_for_barber(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<Vec<Appointment>> {
        let mut found: Vec<Appointment> = self
            .lock()
            .appointments
            .iter()
            .map(|s| &s.appointment)
            .filter(|a| a.barber_id == barber_id && a.date == date)
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.time, a.created_at));
        Ok(found)
    }

    async fn availability_procedure(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<Option<Vec<SlotAvailability>>> {
        let Some(delay) = self.options.availability_procedure else {
            return Ok(None);
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        // Same tiers as the resolver, computed "server-side"
        let weekday = slots::day_of_week(date);
        let mut candidates = slots::expand_rules(&self.active_rules(RuleScope::Barber(barber_id), weekday).await?);
        if candidates.is_empty() {
            candidates = slots::expand_rules(&self.active_rules(RuleScope::BusinessDefault, weekday).await?);
        }
        if candidates.is_empty() {
            candidates = slots::fallback_template(date.weekday());
        }
        let occupied = self.occupied_times(barber_id, date).await?;
        Ok(Some(
            candidates
                .into_iter()
                .map(|t| SlotAvailability {
                    // the procedure reports seconds, like Postgres `time::text`
                    time: format!("{}:00", t),
                    is_available: !occupied.iter().any(|o| TimeOfDay::parse(o).ok() == Some(t)),
                })
                .collect(),
        ))
    }

    async fn book_atomic(&self, appointment: &NewAppointment) -> AppResult<Option<Appointment>> {
        if !self.options.atomic_procedure {
            return Ok(None);
        }
        // check and insert under one lock acquisition
        let mut state = self.lock();
        if state
            .appointments
            .iter()
            .any(|s| Self::holds(&s.appointment, appointment.barber_id, appointment.date, appointment.time))
        {
            return Err(AppError::SlotConflict(appointment.slot_label()));
        }
        let created_at = Self::next_timestamp(&mut state);
        let created = Appointment {
            id: Uuid::new_v4(),
            client_id: appointment.client_id,
            barber_id: appointment.barber_id,
            service_id: appointment.service_id,
            date: appointment.date,
            time: appointment.time,
            status: AppointmentStatus::Scheduled,
            price: appointment.price,
            created_at,
        };
        state.appointments.push(StoredAppointment {
            appointment: created.clone(),
            raw_time: created.time.to_string(),
        });
        Ok(Some(created))
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn barber(&self, id: Uuid) -> AppResult<Option<Barber>> {
        Ok(self.lock().barbers.get(&id).cloned())
    }

    async fn service_price(&self, id: Uuid) -> AppResult<Option<Decimal>> {
        Ok(self.lock().prices.get(&id).copied())
    }
}
