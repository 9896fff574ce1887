//! Working-hours administration

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use super::{cache::AvailabilityCache, schedule::ScheduleResolver};
use crate::{
    error::{AppError, AppResult},
    models::working_hours::{
        CreateWorkingHoursRule, ReplaceWorkingHours, ResolvedSchedule, RuleScope, RuleWindow,
        WorkingHoursQuery, WorkingHoursRule,
    },
    repository::WorkingHoursAdminStore,
    slots,
};

#[derive(Clone)]
pub struct WorkingHoursService {
    rules: Arc<dyn WorkingHoursAdminStore>,
    resolver: ScheduleResolver,
    cache: Arc<dyn AvailabilityCache>,
}

impl WorkingHoursService {
    pub fn new(
        rules: Arc<dyn WorkingHoursAdminStore>,
        resolver: ScheduleResolver,
        cache: Arc<dyn AvailabilityCache>,
    ) -> Self {
        Self {
            rules,
            resolver,
            cache,
        }
    }

    pub async fn list(&self, query: &WorkingHoursQuery) -> AppResult<Vec<WorkingHoursRule>> {
        self.rules
            .list(query.barber_id.into(), query.include_inactive)
            .await
    }

    pub async fn create(&self, data: &CreateWorkingHoursRule) -> AppResult<WorkingHoursRule> {
        data.validate()?;
        validate_window(&data.window)?;

        let scope = RuleScope::from(data.barber_id);
        let existing = self.active_windows(scope, data.day_of_week, None).await?;
        if let Some(other) = existing.iter().find(|w| overlaps(w, &data.window)) {
            return Err(AppError::BusinessRule(format!(
                "Window {}-{} overlaps the active window {}-{}",
                data.window.start_time, data.window.end_time, other.start_time, other.end_time
            )));
        }

        let rule = self
            .rules
            .create(scope, data.day_of_week, &data.window)
            .await?;
        self.invalidate(scope).await;
        Ok(rule)
    }

    /// Deactivate the active rules of a (scope, day) and insert the new set
    pub async fn replace(&self, data: &ReplaceWorkingHours) -> AppResult<Vec<WorkingHoursRule>> {
        data.validate()?;
        validate_windows(&data.windows)?;

        let scope = RuleScope::from(data.barber_id);
        let rules = self
            .rules
            .replace(scope, data.day_of_week, &data.windows)
            .await?;
        self.invalidate(scope).await;
        Ok(rules)
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<WorkingHoursRule> {
        let rule = self.rules.get(id).await?;
        if is_active && !rule.is_active {
            let window = RuleWindow {
                start_time: rule.start_time,
                end_time: rule.end_time,
                interval_minutes: rule.interval_minutes,
            };
            let existing = self.active_windows(rule.scope(), rule.day_of_week, Some(id)).await?;
            if existing.iter().any(|w| overlaps(w, &window)) {
                return Err(AppError::BusinessRule(
                    "Rule overlaps an active window of the same day".to_string(),
                ));
            }
        }

        let updated = self.rules.set_active(id, is_active).await?;
        self.invalidate(updated.scope()).await;
        Ok(updated)
    }

    /// Resolved slots of a barber on a date, with the tier they came from
    pub async fn preview(&self, barber_id: Uuid, date: &str) -> AppResult<ResolvedSchedule> {
        let date = slots::parse_date(date)?;
        self.resolver.resolve(barber_id, date).await
    }

    async fn active_windows(&self, scope: RuleScope, day_of_week: i16, except: Option<Uuid>) -> AppResult<Vec<RuleWindow>> {
        Ok(self
            .rules
            .list(scope, false)
            .await?
            .into_iter()
            .filter(|r| r.day_of_week == day_of_week && Some(r.id) != except)
            .map(|r| RuleWindow {
                start_time: r.start_time,
                end_time: r.end_time,
                interval_minutes: r.interval_minutes,
            })
            .collect())
    }

    async fn invalidate(&self, scope: RuleScope) {
        let result = match scope {
            RuleScope::Barber(barber_id) => self.cache.invalidate_barber(barber_id).await,
            RuleScope::BusinessDefault => self.cache.clear().await,
        };
        if let Err(e) = result {
            tracing::warn!(?scope, error = %e, "Failed to invalidate cached availability");
        }
    }
}

/// A window must start before it ends and fit at least one slot
pub fn validate_window(window: &RuleWindow) -> AppResult<()> {
    if window.start_time >= window.end_time {
        return Err(AppError::Validation(format!(
            "start_time {} must be before end_time {}",
            window.start_time, window.end_time
        )));
    }
    let length = i32::from(window.end_time.minutes() - window.start_time.minutes());
    if window.interval_minutes <= 0 || window.interval_minutes > length {
        return Err(AppError::Validation(format!(
            "interval_minutes {} does not fit in {}-{}",
            window.interval_minutes, window.start_time, window.end_time
        )));
    }
    Ok(())
}

/// Validate each window and reject overlaps within the set
pub fn validate_windows(windows: &[RuleWindow]) -> AppResult<()> {
    for window in windows {
        validate_window(window)?;
    }
    let mut sorted: Vec<&RuleWindow> = windows.iter().collect();
    sorted.sort_by_key(|w| w.start_time);
    for pair in sorted.windows(2) {
        if overlaps(pair[0], pair[1]) {
            return Err(AppError::Validation(format!(
                "Windows {}-{} and {}-{} overlap",
                pair[0].start_time, pair[0].end_time, pair[1].start_time, pair[1].end_time
            )));
        }
    }
    Ok(())
}

fn overlaps(a: &RuleWindow, b: &RuleWindow) -> bool {
    a.start_time < b.end_time && b.start_time < a.end_time
}
