//! # Error Types
//!
//! Domain errors for the finance engine.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How callers should react                             │
//! │                                                                         │
//! │  Validation(..)              → 400, user fixes the input               │
//! │  ExceedsRemainingBalance     → 400, user lowers the amount             │
//! │  DuplicatePeriod             → 409, period already posted               │
//! │  NotFound                    → 404                                      │
//! │  InvalidScheduleStatus       → 422, schedule cancelled                  │
//! │  InvalidAssetStatus          → 422, asset already disposed              │
//! │  ScheduleHasRecognitions     → 400, cannot cancel                       │
//! │                                                                         │
//! │  None of these are retried automatically.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the calculators and their callers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// Referenced asset, schedule or milestone does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Recognition amount is larger than what is left on the schedule.
    ///
    /// ## User Workflow
    /// ```text
    /// Schedule total: $12,000.00, recognized: $5,000.00
    ///      │
    ///      ▼
    /// recognize($8,000.00)
    ///      │
    ///      ▼
    /// ExceedsRemainingBalance { remaining: $7,000.00, requested: $8,000.00 }
    /// ```
    #[error("Amount {requested} exceeds remaining balance of {remaining} on schedule {schedule_id}")]
    ExceedsRemainingBalance {
        schedule_id: String,
        remaining: Money,
        requested: Money,
    },

    /// Depreciation has already been recorded for the period.
    #[error("Depreciation already recorded for period {period}")]
    DuplicatePeriod { period: String },

    /// Schedule is not in a state that allows the requested operation.
    #[error("Schedule {schedule_id} is {status}, cannot perform operation")]
    InvalidScheduleStatus { schedule_id: String, status: String },

    /// Asset is not in a state that allows the requested operation.
    #[error("Asset {asset_id} is {status}, cannot perform operation")]
    InvalidAssetStatus { asset_id: String, status: String },

    /// Schedule already has recognition events and cannot be cancelled.
    #[error("Cannot cancel schedule {schedule_id} with recognized revenue")]
    ScheduleHasRecognitions { schedule_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Malformed or invariant-violating input fields.
///
/// Raised before any computation runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value is out of its allowed range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// One field must not exceed another (salvage vs. cost).
    #[error("{field} must not exceed {limit_field}")]
    Exceeds { field: String, limit_field: String },

    /// End of a date range is not after its start.
    #[error("{end_field} must be after {start_field}")]
    InvalidDateRange {
        start_field: String,
        end_field: String,
    },

    /// Invalid format (e.g., invalid date, invalid period).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::ExceedsRemainingBalance {
            schedule_id: "dr-1".to_string(),
            remaining: Money::from_cents(700_000),
            requested: Money::from_cents(800_000),
        };
        assert_eq!(
            err.to_string(),
            "Amount $8000.00 exceeds remaining balance of $7000.00 on schedule dr-1"
        );

        let err = CoreError::DuplicatePeriod {
            period: "2024-03".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Depreciation already recorded for period 2024-03"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Exceeds {
            field: "salvage_value".to_string(),
            limit_field: "acquisition_cost".to_string(),
        };
        assert_eq!(err.to_string(), "salvage_value must not exceed acquisition_cost");

        let err = ValidationError::InvalidDateRange {
            start_field: "start_date".to_string(),
            end_field: "end_date".to_string(),
        };
        assert_eq!(err.to_string(), "end_date must be after start_date");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
