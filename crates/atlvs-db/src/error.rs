//! # Database Error Types
//!
//! Error types for record store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        Business rejection (CoreError)      │
//! │       │                                    │                            │
//! │       ▼                                    ▼                            │
//! │  DbError::{UniqueViolation, ..}     DbError::Domain(..)                 │
//! │       │                                    │                            │
//! │       └──────────────┬─────────────────────┘                            │
//! │                      ▼                                                  │
//! │  ApiError (finance-api) ← status code + JSON body                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rejections discovered inside a transaction (over-recognition, a second
//! run for the same period, disposing a disposed asset) travel as
//! `Domain` so the HTTP layer maps them exactly like the calculators' own
//! errors.

use atlvs_core::CoreError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate asset number
    /// - Second depreciation entry for the same asset and period
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Recognition against a milestone of another schedule
    /// - Depreciation entry for an unknown asset
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored value could not be read back into its domain type.
    #[error("Corrupt value in {column}: {value}")]
    CorruptColumn { column: String, value: String },

    /// Business rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn corrupt(column: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::CorruptColumn {
            column: column.into(),
            value: value.into(),
        }
    }

    /// True when this is a UNIQUE violation on `table.column`.
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field, .. } if field.split(", ").any(|f| f == column))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite reports "UNIQUE constraint failed: <table>.<column>[, ...]"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_matching() {
        let err = DbError::duplicate("depreciation_runs.period_start", "2024-01-01");
        assert!(err.is_unique_violation_on("depreciation_runs.period_start"));
        assert!(!err.is_unique_violation_on("fixed_assets.asset_number"));

        let composite = DbError::duplicate(
            "depreciation_entries.asset_id, depreciation_entries.period_start",
            "unknown",
        );
        assert!(composite.is_unique_violation_on("depreciation_entries.period_start"));
    }

    #[test]
    fn test_domain_error_is_transparent() {
        let err: DbError = CoreError::DuplicatePeriod {
            period: "2024-01".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Depreciation already recorded for period 2024-01");
    }
}
