//! Barbershop Server - scheduling and booking
//!
//! REST API server for barbershop appointments.

use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use barbershop_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{
        cache::{AvailabilityCache, MemoryAvailabilityCache},
        redis::RedisService,
        Services,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("barbershop_server={},tower_http=debug", config.logging.level).into());

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting Barbershop Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database migrations completed");

    // Shared cache when Redis is configured, process-local otherwise
    let cache: Arc<dyn AvailabilityCache> = match config.redis.url.as_deref() {
        Some(url) => {
            let redis = RedisService::new(url, config.booking.cache_ttl_seconds).await?;
            tracing::info!("Connected to Redis, availability cache is shared");
            Arc::new(redis)
        }
        None => {
            tracing::info!("No Redis configured, using in-process availability cache");
            Arc::new(MemoryAvailabilityCache::new(config.booking.cache_ttl()))
        }
    };

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let repository = Repository::new(pool);
    let services = Services::new(repository, &config.booking, cache);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Availability
        .route("/availability", get(api::availability::get_availability))
        // Appointments
        .route("/appointments", post(api::appointments::book))
        .route("/appointments/me", get(api::appointments::my_appointments))
        .route("/appointments/:id", get(api::appointments::get_appointment))
        .route("/appointments/:id/cancel", post(api::appointments::cancel))
        // Barbers
        .route("/barbers", get(api::barbers::list_barbers))
        .route("/barbers/:id", get(api::barbers::get_barber))
        .route("/barbers/:id/appointments", get(api::appointments::barber_appointments))
        .route("/barbers/:id/schedule", get(api::working_hours::preview_schedule))
        // Working hours
        .route(
            "/working-hours",
            get(api::working_hours::list_rules)
                .post(api::working_hours::create_rule)
                .put(api::working_hours::replace_rules),
        )
        .route("/working-hours/:id/active", put(api::working_hours::set_rule_active))
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
