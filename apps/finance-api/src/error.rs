//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Finance API                        │
//! │                                                                         │
//! │  Handler  Result<Json<T>, ApiError>                                     │
//! │     │                                                                   │
//! │     ├── CoreError::Validation ............... 400 VALIDATION_ERROR      │
//! │     ├── CoreError::ExceedsRemainingBalance .. 400 EXCEEDS_REMAINING     │
//! │     ├── CoreError::ScheduleHasRecognitions .. 400 HAS_RECOGNITIONS      │
//! │     ├── NotFound (core or db) ............... 404 NOT_FOUND             │
//! │     ├── CoreError::DuplicatePeriod .......... 409 DUPLICATE_PERIOD      │
//! │     ├── Invalid schedule / asset status ..... 422 INVALID_STATUS        │
//! │     └── Storage failures .................... 500 DATABASE_ERROR       │
//! │                                                                         │
//! │  Body: { "code": "EXCEEDS_REMAINING", "message": "...", "details": .. } │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage failures are logged with their cause and answered with a
//! generic message.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use atlvs_core::{CoreError, ValidationError};
use atlvs_db::DbError;

/// Error body returned by every failing request.
///
/// ```json
/// {
///   "code": "EXCEEDS_REMAINING",
///   "message": "Amount 8000.00 exceeds remaining balance of 7000.00 on schedule ...",
///   "details": { "remaining": 7000.0, "requested": 8000.0 }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Recognition larger than the schedule's remaining balance (400)
    ExceedsRemaining,

    /// Schedule with recognitions cannot be cancelled (400)
    HasRecognitions,

    /// Resource not found (404)
    NotFound,

    /// Period already posted (409)
    DuplicatePeriod,

    /// Unique key collision other than a period (409)
    Conflict,

    /// Schedule or asset state forbids the operation (422)
    InvalidStatus,

    /// Database operation failed (500)
    DatabaseError,

    /// Database temporarily unable to serve (503)
    Unavailable,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError | ErrorCode::ExceedsRemaining | ErrorCode::HasRecognitions => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::DuplicatePeriod | ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InvalidStatus => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            CoreError::Validation(e) => ApiError::from(e),
            CoreError::ExceedsRemainingBalance {
                schedule_id,
                remaining,
                requested,
            } => ApiError::new(ErrorCode::ExceedsRemaining, message).with_details(json!({
                "schedule_id": schedule_id,
                "remaining": remaining,
                "requested": requested,
            })),
            CoreError::DuplicatePeriod { period } => ApiError::new(ErrorCode::DuplicatePeriod, message)
                .with_details(json!({ "period": period })),
            CoreError::ScheduleHasRecognitions { .. } => {
                ApiError::new(ErrorCode::HasRecognitions, message)
            }
            CoreError::InvalidScheduleStatus { status, .. }
            | CoreError::InvalidAssetStatus { status, .. } => {
                ApiError::new(ErrorCode::InvalidStatus, message)
                    .with_details(json!({ "status": status }))
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => ApiError::from(e),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::Unavailable, "Database pool exhausted")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::CorruptColumn { column, value } => {
                tracing::error!(column = %column, value = %value, "Unreadable stored value");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Unit Tests
// =============================================================================
