//! Availability endpoint

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        parse_id,
        slot::{AvailabilityQuery, SlotAvailability},
    },
};

/// Slots of a barber on a date, each flagged free or taken
#[utoipa::path(
    get,
    path = "/availability",
    tag = "availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Slots in ascending time order", body = Vec<SlotAvailability>),
        (status = 400, description = "Missing or malformed barber_id or date", body = crate::error::ErrorResponse),
        (status = 503, description = "Storage temporarily unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_availability(
    State(state): State<crate::AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<Vec<SlotAvailability>>> {
    let barber_id = parse_id("barber_id", query.barber_id.as_deref())?;
    let date = query
        .date
        .as_deref()
        .ok_or_else(|| AppError::Validation("date is required".to_string()))?;

    let slots = state.services.availability.get_availability(barber_id, date).await?;
    Ok(Json(slots))
}
