//! Barbers and services lookups

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::CatalogStore;
use crate::{
    error::{AppError, AppResult},
    models::barber::Barber,
};

#[derive(Clone)]
pub struct BarbersRepository {
    pool: Pool<Postgres>,
}

impl BarbersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List active barbers, ordered by name
    pub async fn list_active(&self) -> AppResult<Vec<Barber>> {
        let rows = sqlx::query_as::<_, Barber>(
            "SELECT id, name, is_active, created_at FROM barbers WHERE is_active ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get a barber by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Barber> {
        self.barber(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Barber {} not found", id)))
    }
}

#[async_trait]
impl CatalogStore for BarbersRepository {
    async fn barber(&self, id: Uuid) -> AppResult<Option<Barber>> {
        let row = sqlx::query_as::<_, Barber>(
            "SELECT id, name, is_active, created_at FROM barbers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn service_price(&self, id: Uuid) -> AppResult<Option<Decimal>> {
        let price = sqlx::query_scalar::<_, Decimal>("SELECT price FROM services WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(price)
    }
}
