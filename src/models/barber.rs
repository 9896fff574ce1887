//! Barber model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Barber {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}
