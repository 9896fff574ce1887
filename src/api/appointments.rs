//! Appointment endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        appointment::{Appointment, BarberAppointmentsQuery, BookAppointment, MyAppointmentsQuery},
        parse_id,
        user::Role,
    },
};

use super::AuthenticatedUser;

/// Book a slot
///
/// A `409` carries the message "Este horário já está ocupado..."; the client
/// should re-fetch availability before choosing again. A `504` means the
/// booking may have been recorded.
#[utoipa::path(
    post,
    path = "/appointments",
    tag = "appointments",
    security(("bearer_auth" = [])),
    request_body = BookAppointment,
    responses(
        (status = 201, description = "Appointment booked", body = Appointment),
        (status = 400, description = "Missing or malformed field", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown barber or service", body = crate::error::ErrorResponse),
        (status = 409, description = "Slot already taken", body = crate::error::ErrorResponse),
        (status = 422, description = "Slot not offered or in the past", body = crate::error::ErrorResponse),
        (status = 503, description = "Storage temporarily unavailable", body = crate::error::ErrorResponse),
        (status = 504, description = "Outcome unknown, check before retrying", body = crate::error::ErrorResponse)
    )
)]
pub async fn book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(mut data): Json<BookAppointment>,
) -> AppResult<(StatusCode, Json<Appointment>)> {
    // clients book for themselves unless they say otherwise
    if data.client_id.is_none() && claims.role == Role::Client {
        data.client_id = Some(claims.sub.to_string());
    }
    let client_id = parse_id("client_id", data.client_id.as_deref())?;
    claims.require_self_or_admin(client_id)?;

    let appointment = state.services.booking.book(data).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// Get an appointment
#[utoipa::path(
    get,
    path = "/appointments/{id}",
    tag = "appointments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment", body = Appointment),
        (status = 404, description = "Appointment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_appointment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Appointment>> {
    let appointment = state.services.booking.get(id).await?;
    if claims.role == Role::Barber {
        claims.require_barber_or_admin(appointment.barber_id)?;
    } else {
        claims.require_self_or_admin(appointment.client_id)?;
    }
    Ok(Json(appointment))
}

/// Cancel an appointment, freeing its slot
#[utoipa::path(
    post,
    path = "/appointments/{id}/cancel",
    tag = "appointments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment canceled", body = Appointment),
        (status = 404, description = "Appointment not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Already canceled", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Appointment>> {
    let appointment = state.services.booking.get(id).await?;
    claims.require_self_or_admin(appointment.client_id)?;

    let canceled = state.services.booking.cancel(id).await?;
    Ok(Json(canceled))
}

/// List the caller's appointments, latest first
#[utoipa::path(
    get,
    path = "/appointments/me",
    tag = "appointments",
    security(("bearer_auth" = [])),
    params(MyAppointmentsQuery),
    responses(
        (status = 200, description = "Caller's appointments", body = Vec<Appointment>)
    )
)]
pub async fn my_appointments(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<MyAppointmentsQuery>,
) -> AppResult<Json<Vec<Appointment>>> {
    let appointments = state
        .services
        .booking
        .list_for_client(claims.sub, query.include_canceled)
        .await?;
    Ok(Json(appointments))
}

/// A barber's agenda for one date
#[utoipa::path(
    get,
    path = "/barbers/{id}/appointments",
    tag = "appointments",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Barber ID"),
        BarberAppointmentsQuery
    ),
    responses(
        (status = 200, description = "Appointments of the day, canceled included", body = Vec<Appointment>)
    )
)]
pub async fn barber_appointments(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(barber_id): Path<Uuid>,
    Query(query): Query<BarberAppointmentsQuery>,
) -> AppResult<Json<Vec<Appointment>>> {
    claims.require_barber_or_admin(barber_id)?;
    let appointments = state
        .services
        .booking
        .list_for_barber(barber_id, &query.date)
        .await?;
    Ok(Json(appointments))
}
