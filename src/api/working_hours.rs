//! Working-hours administration endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::working_hours::{
        CreateWorkingHoursRule, ReplaceWorkingHours, ResolvedSchedule, SchedulePreviewQuery,
        UpdateRuleActive, WorkingHoursQuery, WorkingHoursRule,
    },
};

use super::AuthenticatedUser;

/// List working-hours rules of a barber, or the business defaults
#[utoipa::path(
    get,
    path = "/working-hours",
    tag = "working-hours",
    security(("bearer_auth" = [])),
    params(WorkingHoursQuery),
    responses(
        (status = 200, description = "Rules ordered by day and start time", body = Vec<WorkingHoursRule>)
    )
)]
pub async fn list_rules(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<WorkingHoursQuery>,
) -> AppResult<Json<Vec<WorkingHoursRule>>> {
    claims.require_admin()?;
    let rules = state.services.working_hours.list(&query).await?;
    Ok(Json(rules))
}

/// Add a working-hours window
#[utoipa::path(
    post,
    path = "/working-hours",
    tag = "working-hours",
    security(("bearer_auth" = [])),
    request_body = CreateWorkingHoursRule,
    responses(
        (status = 201, description = "Rule created", body = WorkingHoursRule),
        (status = 400, description = "Invalid window", body = crate::error::ErrorResponse),
        (status = 422, description = "Overlaps an active window", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_rule(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateWorkingHoursRule>,
) -> AppResult<(StatusCode, Json<WorkingHoursRule>)> {
    claims.require_admin()?;
    let rule = state.services.working_hours.create(&data).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

/// Replace the active windows of one day
#[utoipa::path(
    put,
    path = "/working-hours",
    tag = "working-hours",
    security(("bearer_auth" = [])),
    request_body = ReplaceWorkingHours,
    responses(
        (status = 200, description = "New active rule set", body = Vec<WorkingHoursRule>),
        (status = 400, description = "Invalid or overlapping windows", body = crate::error::ErrorResponse)
    )
)]
pub async fn replace_rules(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<ReplaceWorkingHours>,
) -> AppResult<Json<Vec<WorkingHoursRule>>> {
    claims.require_admin()?;
    let rules = state.services.working_hours.replace(&data).await?;
    Ok(Json(rules))
}

/// Activate or deactivate a rule
#[utoipa::path(
    put,
    path = "/working-hours/{id}/active",
    tag = "working-hours",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Rule ID")),
    request_body = UpdateRuleActive,
    responses(
        (status = 200, description = "Rule updated", body = WorkingHoursRule),
        (status = 404, description = "Rule not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn set_rule_active(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateRuleActive>,
) -> AppResult<Json<WorkingHoursRule>> {
    claims.require_admin()?;
    let rule = state.services.working_hours.set_active(id, data.is_active).await?;
    Ok(Json(rule))
}

/// Preview the slots a barber offers on a date
#[utoipa::path(
    get,
    path = "/barbers/{id}/schedule",
    tag = "working-hours",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Barber ID"),
        SchedulePreviewQuery
    ),
    responses(
        (status = 200, description = "Resolved slots and their source", body = ResolvedSchedule)
    )
)]
pub async fn preview_schedule(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(barber_id): Path<Uuid>,
    Query(query): Query<SchedulePreviewQuery>,
) -> AppResult<Json<ResolvedSchedule>> {
    claims.require_barber_or_admin(barber_id)?;
    let schedule = state.services.working_hours.preview(barber_id, &query.date).await?;
    Ok(Json(schedule))
}
