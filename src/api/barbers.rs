//! Barber listing endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{error::AppResult, models::barber::Barber};

/// List barbers open for booking
#[utoipa::path(
    get,
    path = "/barbers",
    tag = "barbers",
    responses(
        (status = 200, description = "Active barbers", body = Vec<Barber>)
    )
)]
pub async fn list_barbers(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Barber>>> {
    let barbers = state.services.barbers.list_active().await?;
    Ok(Json(barbers))
}

/// Get a barber
#[utoipa::path(
    get,
    path = "/barbers/{id}",
    tag = "barbers",
    params(("id" = Uuid, Path, description = "Barber ID")),
    responses(
        (status = 200, description = "Barber", body = Barber),
        (status = 404, description = "Barber not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_barber(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Barber>> {
    let barber = state.services.barbers.get(id).await?;
    Ok(Json(barber))
}
