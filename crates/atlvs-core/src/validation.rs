//! # Validation Module
//!
//! Input validation for assets, schedules and recognition requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Required fields, number inputs                                    │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: finance-api (Rust)                                           │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on amounts                                      │
//! │  ├── UNIQUE (asset_number, depreciation period)                        │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The calculators call these too, so a malformed record loaded from
//! storage is rejected instead of producing a nonsense schedule.
//!
//! ## Usage
//! ```rust
//! use atlvs_core::validation::{validate_name, validate_positive_amount};
//! use atlvs_core::Money;
//!
//! validate_name("name", "Delivery Van").unwrap();
//! assert!(validate_positive_amount("amount", Money::zero()).is_err());
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ValidationError;
use crate::money::{Money, MAX_AMOUNT};
use crate::types::{DepreciationMethod, NewDeferredRevenueSchedule, NewFixedAsset, NewMilestone};
use crate::MAX_REPORT_MONTHS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted name or identifier.
pub const MAX_NAME_LENGTH: usize = 200;

/// Longest accepted free-text field (notes, descriptions).
pub const MAX_TEXT_LENGTH: usize = 2000;

/// Longest accepted useful life, in years.
pub const MAX_USEFUL_LIFE_YEARS: Decimal = dec!(200);

/// Highest accepted annual declining-balance rate. At 12 the monthly charge
/// equals the whole remaining book value.
pub const MAX_DEPRECIATION_RATE: Decimal = dec!(12);

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required short string (names, client ids).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates an optional free-text field.
pub fn validate_text(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(text) if text.chars().count() > MAX_TEXT_LENGTH => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LENGTH,
        }),
        _ => Ok(()),
    }
}

/// Validates a 3-letter ISO currency code.
pub fn validate_currency(code: &str) -> ValidationResult<()> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency".to_string(),
            reason: "must be a 3-letter uppercase ISO code".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Amount Validators
// =============================================================================

/// Amount must be strictly positive (costs, schedule totals, recognitions)
/// and no larger than [`MAX_AMOUNT`].
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    validate_amount_limit(field, amount, Money::from_cents(1))
}

/// Amount must be zero or more (salvage, disposal proceeds) and no larger
/// than [`MAX_AMOUNT`].
pub fn validate_non_negative_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    validate_amount_limit(field, amount, Money::zero())
}

fn validate_amount_limit(field: &str, amount: Money, min: Money) -> ValidationResult<()> {
    if amount > MAX_AMOUNT {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: min.to_decimal().to_string(),
            max: MAX_AMOUNT.to_decimal().to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Depreciation Terms
// =============================================================================

/// Validates the inputs every depreciation method depends on.
///
/// ## Rules
/// - cost > 0
/// - 0 <= salvage <= cost
/// - 0 < useful life <= 200 years
/// - explicit rate, when given, 0 < rate <= 12
/// - sum-of-years needs a whole-number life (the digit weights are per year)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Asset Register: Add Asset                                             │
/// │                                                                         │
/// │  cost $12,000, salvage $15,000, life 5                                 │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_depreciation_terms(..) ← THIS FUNCTION                       │
/// │       │                                                                 │
/// │       └── salvage > cost → "salvage_value must not exceed              │
/// │                             acquisition_cost"                          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_depreciation_terms(
    cost: Money,
    salvage: Money,
    useful_life_years: Decimal,
    method: DepreciationMethod,
    rate: Option<Decimal>,
) -> ValidationResult<()> {
    validate_positive_amount("acquisition_cost", cost)?;
    validate_non_negative_amount("salvage_value", salvage)?;

    if salvage > cost {
        return Err(ValidationError::Exceeds {
            field: "salvage_value".to_string(),
            limit_field: "acquisition_cost".to_string(),
        });
    }

    if useful_life_years <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "useful_life_years".to_string(),
        });
    }
    if useful_life_years > MAX_USEFUL_LIFE_YEARS {
        return Err(ValidationError::OutOfRange {
            field: "useful_life_years".to_string(),
            min: "0".to_string(),
            max: MAX_USEFUL_LIFE_YEARS.to_string(),
        });
    }

    if let Some(rate) = rate {
        if rate <= Decimal::ZERO {
            return Err(ValidationError::MustBePositive {
                field: "depreciation_rate".to_string(),
            });
        }
        if rate > MAX_DEPRECIATION_RATE {
            return Err(ValidationError::OutOfRange {
                field: "depreciation_rate".to_string(),
                min: "0".to_string(),
                max: MAX_DEPRECIATION_RATE.to_string(),
            });
        }
    }

    if method == DepreciationMethod::SumOfYears && !useful_life_years.fract().is_zero() {
        return Err(ValidationError::InvalidFormat {
            field: "useful_life_years".to_string(),
            reason: "sum_of_years requires a whole number of years".to_string(),
        });
    }

    Ok(())
}

/// Validates a new asset before it is registered.
pub fn validate_new_asset(input: &NewFixedAsset) -> ValidationResult<()> {
    validate_name("name", &input.name)?;
    validate_text("description", input.description.as_deref())?;
    validate_text("notes", input.notes.as_deref())?;
    validate_depreciation_terms(
        input.acquisition_cost,
        input.salvage_value,
        input.useful_life_years,
        input.depreciation_method,
        input.depreciation_rate,
    )
}

// =============================================================================
// Schedule Validators
// =============================================================================

/// Validates a schedule date range: end strictly after start.
pub fn validate_date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> ValidationResult<()> {
    if end <= start {
        return Err(ValidationError::InvalidDateRange {
            start_field: "start_date".to_string(),
            end_field: "end_date".to_string(),
        });
    }
    Ok(())
}

/// Validates milestone inputs.
///
/// ## Rules
/// - Each name present
/// - Each percentage within 0-100
/// - Percentages together do not exceed 100
pub fn validate_milestones(milestones: &[NewMilestone]) -> ValidationResult<()> {
    let mut total = Decimal::ZERO;

    for milestone in milestones {
        validate_name("milestone name", &milestone.name)?;

        if milestone.percentage < Decimal::ZERO || milestone.percentage > Decimal::ONE_HUNDRED {
            return Err(ValidationError::OutOfRange {
                field: "milestone percentage".to_string(),
                min: "0".to_string(),
                max: "100".to_string(),
            });
        }
        total += milestone.percentage;
    }

    if total > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "total milestone percentage".to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        });
    }

    Ok(())
}

/// Validates a new deferred revenue schedule.
pub fn validate_new_schedule(input: &NewDeferredRevenueSchedule) -> ValidationResult<()> {
    validate_name("client_id", &input.client_id)?;
    validate_positive_amount("total_amount", input.total_amount)?;
    validate_date_range(input.start_date, input.end_date)?;
    if let Some(currency) = input.currency.as_deref() {
        validate_currency(currency)?;
    }
    validate_text("description", input.description.as_deref())?;
    validate_milestones(&input.milestones)
}

// =============================================================================
// Report Window
// =============================================================================

/// Validates the month count of a forecast or waterfall request (1-60).
pub fn validate_report_months(months: u32) -> ValidationResult<()> {
    if months == 0 || months > MAX_REPORT_MONTHS {
        return Err(ValidationError::OutOfRange {
            field: "months".to_string(),
            min: "1".to_string(),
            max: MAX_REPORT_MONTHS.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use atlvs_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
