//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{appointments, availability, barbers, health, working_hours};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Barbershop API",
        version = "1.0.0",
        description = "Barbershop scheduling and booking REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Availability
        availability::get_availability,
        // Appointments
        appointments::book,
        appointments::get_appointment,
        appointments::cancel,
        appointments::my_appointments,
        appointments::barber_appointments,
        // Barbers
        barbers::list_barbers,
        barbers::get_barber,
        // Working hours
        working_hours::list_rules,
        working_hours::create_rule,
        working_hours::replace_rules,
        working_hours::set_rule_active,
        working_hours::preview_schedule,
    ),
    components(
        schemas(
            // Availability
            crate::models::slot::SlotAvailability,
            // Appointments
            crate::models::appointment::Appointment,
            crate::models::appointment::AppointmentStatus,
            crate::models::appointment::BookAppointment,
            // Barbers
            crate::models::barber::Barber,
            // Working hours
            crate::models::working_hours::WorkingHoursRule,
            crate::models::working_hours::RuleWindow,
            crate::models::working_hours::CreateWorkingHoursRule,
            crate::models::working_hours::ReplaceWorkingHours,
            crate::models::working_hours::UpdateRuleActive,
            crate::models::working_hours::ScheduleSource,
            crate::models::working_hours::ResolvedSchedule,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "availability", description = "Slot availability"),
        (name = "appointments", description = "Booking and cancellation"),
        (name = "barbers", description = "Barbers"),
        (name = "working-hours", description = "Working-hours administration")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme("bearer_auth", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
