//! # atlvs-core: Pure Financial Calculators for ATLVS
//!
//! This crate is the **heart** of the ATLVS finance engine. It contains the
//! fixed-asset depreciation calculator and the deferred-revenue recognition
//! scheduler as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ATLVS Finance Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Frontend (Next.js finance pages)                │   │
//! │  │    Asset Register ──► Depreciation ──► Deferred Revenue        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    finance-api (axum)                           │   │
//! │  │    record-depreciation, dispose-asset, recognize-revenue ...    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ atlvs-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────┐ ┌─────────────┐ ┌───────────┐ ┌───────────┐  │   │
//! │  │   │   dates    │ │depreciation │ │recognition│ │ reporting │  │   │
//! │  │   │ MonthKey   │ │ StraightLine│ │ Forecast  │ │ by month  │  │   │
//! │  │   │ 30.44 days │ │ Declining   │ │ Waterfall │ │ by categ. │  │   │
//! │  │   └────────────┘ └─────────────┘ └───────────┘ └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    atlvs-db (Record Store)                      │   │
//! │  │        SQLite tables, atomic recognition, period runs           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer cents
//! - [`dates`] - Day counts, 30.44-day months, calendar month buckets
//! - [`types`] - Domain records (FixedAsset, DeferredRevenueSchedule, ...)
//! - [`depreciation`] - Depreciation calculator, period runs, disposals
//! - [`recognition`] - Recognition projection, forecast, waterfall
//! - [`reporting`] - Grouping and totals for read-side reports
//! - [`ledger`] - Ledger entry derivation
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Explicit as-of**: every calculation takes its reference instant
//! 2. **Integer Money**: results are whole cents; formulas run in `Decimal`
//! 3. **Round half away from zero** at each computation boundary
//! 4. **Explicit Errors**: invalid inputs are rejected, never clamped
//!
//! ## Example Usage
//!
//! ```rust
//! use atlvs_core::depreciation::{calculate, DepreciationTerms};
//! use atlvs_core::{DepreciationMethod, Money};
//! use chrono::{Duration, TimeZone, Utc};
//! use rust_decimal_macros::dec;
//!
//! let acquired = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
//! let terms = DepreciationTerms {
//!     acquisition_date: acquired,
//!     acquisition_cost: Money::from_major_minor(12_000, 0),
//!     salvage_value: Money::zero(),
//!     useful_life_years: dec!(5),
//!     method: DepreciationMethod::StraightLine,
//!     depreciation_rate: None,
//! };
//!
//! let snapshot = calculate(&terms, acquired + Duration::days(914)).unwrap();
//! assert_eq!(snapshot.monthly, Money::from_major_minor(200, 0));
//! assert_eq!(snapshot.accumulated, Money::from_major_minor(6_000, 0));
//! assert_eq!(snapshot.remaining_months, 30);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod dates;
pub mod depreciation;
pub mod error;
pub mod ledger;
pub mod money;
pub mod recognition;
pub mod reporting;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use dates::{AccountingPeriod, MonthKey};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default number of months covered by forecast and waterfall reports.
pub const DEFAULT_REPORT_MONTHS: u32 = 12;

/// Upper bound for forecast and waterfall windows (five years).
pub const MAX_REPORT_MONTHS: u32 = 60;

/// Prefix for generated asset numbers (`FA-000001`).
pub const ASSET_NUMBER_PREFIX: &str = "FA";

/// Default currency for deferred revenue schedules.
pub const DEFAULT_CURRENCY: &str = "USD";
