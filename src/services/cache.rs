//! Availability cache
//!
//! Cached slot lists only save repeated computations for rendering. They are
//! never consulted by the booking conflict check, and every booking,
//! cancellation or working-hours change invalidates the affected entries.
//!
//! Every invalidation also bumps a generation covering the entries it drops.
//! A reader records the generation before computing and its `put` is refused
//! when an invalidation happened in between, so a slot list computed before a
//! booking never lands in the cache after that booking cleared it.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::slot::SlotAvailability,
};

#[async_trait]
pub trait AvailabilityCache: Send + Sync {
    async fn get(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<Option<Vec<SlotAvailability>>>;

    /// Current invalidation generation of one (barber, date)
    async fn generation(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<u64>;

    /// Store slots computed at generation `seen`.
    /// Returns `false` without writing when the entry was invalidated since.
    async fn put(&self, barber_id: Uuid, date: NaiveDate, seen: u64, slots: &[SlotAvailability]) -> AppResult<bool>;

    /// Drop the entry of one (barber, date)
    async fn invalidate(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<()>;

    /// Drop every entry of one barber
    async fn invalidate_barber(&self, barber_id: Uuid) -> AppResult<()>;

    /// Drop everything (business-default hours changed)
    async fn clear(&self) -> AppResult<()>;
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<(Uuid, NaiveDate), (Instant, Vec<SlotAvailability>)>,
    slot_generations: HashMap<(Uuid, NaiveDate), u64>,
    barber_generations: HashMap<Uuid, u64>,
    global_generation: u64,
}

impl CacheState {
    /// Sum of the counters covering the key; each only grows, so any bump changes it
    fn generation(&self, barber_id: Uuid, date: NaiveDate) -> u64 {
        self.global_generation
            + self.barber_generations.get(&barber_id).copied().unwrap_or(0)
            + self.slot_generations.get(&(barber_id, date)).copied().unwrap_or(0)
    }
}

/// Process-local cache with a fixed TTL
pub struct MemoryAvailabilityCache {
    ttl: Duration,
    state: RwLock<CacheState>,
}

impl MemoryAvailabilityCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(CacheState::default()),
        }
    }

    fn poisoned() -> AppError {
        AppError::Internal("availability cache lock poisoned".to_string())
    }
}

#[async_trait]
impl AvailabilityCache for MemoryAvailabilityCache {
    async fn get(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<Option<Vec<SlotAvailability>>> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state
            .entries
            .get(&(barber_id, date))
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, slots)| slots.clone()))
    }

    async fn generation(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<u64> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state.generation(barber_id, date))
    }

    async fn put(&self, barber_id: Uuid, date: NaiveDate, seen: u64, slots: &[SlotAvailability]) -> AppResult<bool> {
        if self.ttl.is_zero() {
            return Ok(false);
        }
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        if state.generation(barber_id, date) != seen {
            return Ok(false);
        }
        let ttl = self.ttl;
        state.entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        state.entries.insert((barber_id, date), (Instant::now(), slots.to_vec()));
        Ok(true)
    }

    async fn invalidate(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<()> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        state.entries.remove(&(barber_id, date));
        *state.slot_generations.entry((barber_id, date)).or_default() += 1;
        Ok(())
    }

    async fn invalidate_barber(&self, barber_id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        state.entries.retain(|(barber, _), _| *barber != barber_id);
        *state.barber_generations.entry(barber_id).or_default() += 1;
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        state.entries.clear();
        state.global_generation += 1;
        Ok(())
    }
}
