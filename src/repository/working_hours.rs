//! Working-hours repository (barber and business-default rules)

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{WorkingHoursAdminStore, WorkingHoursStore};
use crate::{
    error::{AppError, AppResult},
    models::working_hours::{RuleScope, RuleWindow, WorkingHoursRow, WorkingHoursRule},
};

const RULE_COLUMNS: &str =
    "id, barber_id, day_of_week, start_time, end_time, interval_minutes, is_active, created_at";

#[derive(Clone)]
pub struct WorkingHoursRepository {
    pool: Pool<Postgres>,
}

impl WorkingHoursRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkingHoursAdminStore for WorkingHoursRepository {
    async fn list(&self, scope: RuleScope, include_inactive: bool) -> AppResult<Vec<WorkingHoursRule>> {
        let query = format!(
            "SELECT {} FROM working_hours \
             WHERE barber_id IS NOT DISTINCT FROM $1 AND ($2 OR is_active) \
             ORDER BY day_of_week, start_time",
            RULE_COLUMNS
        );
        let rows = sqlx::query_as::<_, WorkingHoursRow>(&query)
            .bind(scope.barber_id())
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(WorkingHoursRule::from).collect())
    }

    async fn get(&self, id: Uuid) -> AppResult<WorkingHoursRule> {
        let query = format!("SELECT {} FROM working_hours WHERE id = $1", RULE_COLUMNS);
        sqlx::query_as::<_, WorkingHoursRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(WorkingHoursRule::from)
            .ok_or_else(|| AppError::NotFound(format!("Working-hours rule {} not found", id)))
    }

    async fn create(&self, scope: RuleScope, day_of_week: i16, window: &RuleWindow) -> AppResult<WorkingHoursRule> {
        let query = format!(
            r#"
            INSERT INTO working_hours (barber_id, day_of_week, start_time, end_time, interval_minutes, is_active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING {}
            "#,
            RULE_COLUMNS
        );
        let row = sqlx::query_as::<_, WorkingHoursRow>(&query)
            .bind(scope.barber_id())
            .bind(day_of_week)
            .bind(window.start_time.to_naive())
            .bind(window.end_time.to_naive())
            .bind(window.interval_minutes)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn replace(&self, scope: RuleScope, day_of_week: i16, windows: &[RuleWindow]) -> AppResult<Vec<WorkingHoursRule>> {
        let mut tx = self.pool.begin().await?;

        let deactivated = sqlx::query(
            r#"
            UPDATE working_hours
            SET is_active = FALSE, updated_at = NOW()
            WHERE barber_id IS NOT DISTINCT FROM $1 AND day_of_week = $2 AND is_active
            "#,
        )
        .bind(scope.barber_id())
        .bind(day_of_week)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let query = format!(
            r#"
            INSERT INTO working_hours (barber_id, day_of_week, start_time, end_time, interval_minutes, is_active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING {}
            "#,
            RULE_COLUMNS
        );
        let mut created = Vec::with_capacity(windows.len());
        for window in windows {
            let row = sqlx::query_as::<_, WorkingHoursRow>(&query)
                .bind(scope.barber_id())
                .bind(day_of_week)
                .bind(window.start_time.to_naive())
                .bind(window.end_time.to_naive())
                .bind(window.interval_minutes)
                .fetch_one(&mut *tx)
                .await?;
            created.push(WorkingHoursRule::from(row));
        }

        tx.commit().await?;

        tracing::info!(
            ?scope,
            day_of_week,
            deactivated,
            inserted = created.len(),
            "Working hours replaced"
        );
        Ok(created)
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<WorkingHoursRule> {
        let query = format!(
            "UPDATE working_hours SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            RULE_COLUMNS
        );
        sqlx::query_as::<_, WorkingHoursRow>(&query)
            .bind(id)
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await?
            .map(WorkingHoursRule::from)
            .ok_or_else(|| AppError::NotFound(format!("Working-hours rule {} not found", id)))
    }
}

#[async_trait]
impl WorkingHoursStore for WorkingHoursRepository {
    async fn active_rules(&self, scope: RuleScope, day_of_week: i16) -> AppResult<Vec<WorkingHoursRule>> {
        let query = format!(
            "SELECT {} FROM working_hours \
             WHERE barber_id IS NOT DISTINCT FROM $1 AND day_of_week = $2 AND is_active \
             ORDER BY start_time",
            RULE_COLUMNS
        );
        let rows = sqlx::query_as::<_, WorkingHoursRow>(&query)
            .bind(scope.barber_id())
            .bind(day_of_week)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(WorkingHoursRule::from).collect())
    }
}
