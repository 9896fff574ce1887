//! Error types for the booking server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message returned to clients when a slot is taken; callers match on "já está ocupado"
pub const SLOT_OCCUPIED_MESSAGE: &str = "Este horário já está ocupado. Por favor, escolha outro horário.";

/// Postgres SQLSTATE codes the repository layer reacts to
pub mod sqlstate {
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const SERIALIZATION_FAILURE: &str = "40001";
    pub const DEADLOCK_DETECTED: &str = "40P01";
    pub const TOO_MANY_CONNECTIONS: &str = "53300";
    pub const CANNOT_CONNECT_NOW: &str = "57P03";
    pub const UNDEFINED_FUNCTION: &str = "42883";
    /// Raised by the `create_appointment` procedure when the slot is taken
    pub const SLOT_OCCUPIED: &str = "P0409";
}

/// Application error codes exposed in error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 4,
    BadValue = 5,
    SlotOccupied = 6,
    TemporarilyUnavailable = 7,
    OutcomeUnknown = 8,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// The requested slot already holds an occupying appointment
    #[error("horário já está ocupado: {0}")]
    SlotConflict(String),

    /// Timeout, pool exhaustion, rate limiting: nothing was committed, safe to retry
    #[error("Temporarily unavailable: {0}")]
    Transient(String),

    /// A write may or may not have been committed
    #[error("Outcome unknown: {0}")]
    AmbiguousOutcome(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),
}

impl AppError {
    /// Whether the failure is transport-level and the operation may be retried
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transient(_))
    }

    pub fn is_slot_conflict(&self) -> bool {
        matches!(self, AppError::SlotConflict(_))
    }

    /// Reclassify a failed write: a dropped connection mid-statement leaves
    /// the commit state unknown
    pub fn from_write(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(ref io) => AppError::AmbiguousOutcome(format!("connection lost during write: {}", io)),
            sqlx::Error::Protocol(ref msg) => AppError::AmbiguousOutcome(format!("protocol error during write: {}", msg)),
            sqlx::Error::WorkerCrashed => AppError::AmbiguousOutcome("database worker crashed during write".to_string()),
            other => AppError::from(other),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => AppError::Transient("database pool timed out".to_string()),
            sqlx::Error::PoolClosed => AppError::Transient("database pool closed".to_string()),
            sqlx::Error::Io(ref io) => AppError::Transient(format!("database connection error: {}", io)),
            sqlx::Error::Database(ref db) => {
                let busy = matches!(
                    db.code().as_deref(),
                    Some(sqlstate::SERIALIZATION_FAILURE)
                        | Some(sqlstate::DEADLOCK_DETECTED)
                        | Some(sqlstate::TOO_MANY_CONNECTIONS)
                        | Some(sqlstate::CANNOT_CONNECT_NOW)
                );
                if busy {
                    AppError::Transient(format!("database busy: {}", db.message()))
                } else {
                    AppError::Database(e)
                }
            }
            other => AppError::Database(other),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::SlotConflict(detail) => {
                tracing::info!("Slot conflict: {}", detail);
                (StatusCode::CONFLICT, ErrorCode::SlotOccupied, SLOT_OCCUPIED_MESSAGE.to_string())
            }
            AppError::Transient(msg) => {
                tracing::warn!("Transient failure surfaced to client: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorCode::TemporarilyUnavailable,
                    "Service temporarily unavailable, please try again".to_string(),
                )
            }
            AppError::AmbiguousOutcome(msg) => {
                tracing::warn!("Ambiguous write outcome: {}", msg);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    ErrorCode::OutcomeUnknown,
                    "The request may have been recorded; check your appointments before retrying".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::BusinessRule(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::Failure, msg.clone())
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
