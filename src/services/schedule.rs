//! Schedule resolution: which slots a barber structurally offers on a date
//!
//! Sources are evaluated in `ScheduleSource::PRECEDENCE` order. Each returns
//! `Some(slots)` when it has configuration for the day (possibly an empty
//! list) or `None` to defer to the next one. The fallback template always
//! answers, so resolution never fails for lack of configuration.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use super::retry::RetryPolicy;
use crate::{
    error::AppResult,
    models::working_hours::{ResolvedSchedule, RuleScope, ScheduleSource},
    repository::WorkingHoursStore,
    slots::{self, TimeOfDay},
};

#[derive(Clone)]
pub struct ScheduleResolver {
    store: Arc<dyn WorkingHoursStore>,
    retry: RetryPolicy,
}

impl ScheduleResolver {
    pub fn new(store: Arc<dyn WorkingHoursStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Ordered `HH:MM` slots for a barber on a `YYYY-MM-DD` date
    pub async fn resolve_slots(&self, barber_id: Uuid, date: &str) -> AppResult<Vec<String>> {
        let date = slots::parse_date(date)?;
        let resolved = self.resolve(barber_id, date).await?;
        Ok(resolved.slots.iter().map(ToString::to_string).collect())
    }

    /// Resolve slots and report which tier produced them
    pub async fn resolve(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<ResolvedSchedule> {
        for source in ScheduleSource::PRECEDENCE {
            if let Some(slots) = self.candidates(source, barber_id, date).await? {
                tracing::debug!(%barber_id, %date, ?source, slots = slots.len(), "Schedule resolved");
                return Ok(ResolvedSchedule {
                    barber_id,
                    date,
                    source,
                    slots,
                });
            }
        }

        Ok(ResolvedSchedule {
            barber_id,
            date,
            source: ScheduleSource::FallbackTemplate,
            slots: Vec::new(),
        })
    }

    async fn candidates(
        &self,
        source: ScheduleSource,
        barber_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Option<Vec<TimeOfDay>>> {
        match source {
            ScheduleSource::BarberRules => self.rule_slots(RuleScope::Barber(barber_id), date).await,
            ScheduleSource::BusinessDefault => self.rule_slots(RuleScope::BusinessDefault, date).await,
            ScheduleSource::FallbackTemplate => Ok(Some(slots::fallback_template(date.weekday()))),
        }
    }

    async fn rule_slots(&self, scope: RuleScope, date: NaiveDate) -> AppResult<Option<Vec<TimeOfDay>>> {
        let day_of_week = slots::day_of_week(date);
        let rules = self
            .retry
            .run("working_hours.active_rules", || self.store.active_rules(scope, day_of_week))
            .await?;

        if rules.is_empty() {
            return Ok(None);
        }
        Ok(Some(slots::expand_rules(&rules)))
    }
}
