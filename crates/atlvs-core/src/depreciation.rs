//! # Depreciation Module
//!
//! Computes an asset's depreciation state at an as-of instant, plans the
//! entries of a monthly period run, and plans disposals.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  calculate(terms, as_of)                                │
//! │                                                                         │
//! │  validate terms ──► months_owned = floor(days / 30.44)                 │
//! │                              │                                          │
//! │          ┌───────────────────┼───────────────────┐                      │
//! │          ▼                   ▼                   ▼                      │
//! │   straight_line      declining_balance      sum_of_years               │
//! │   (units_of_prod.)   month-by-month,        whole + partial            │
//! │                      stops at salvage       years                      │
//! │          └───────────────────┼───────────────────┘                      │
//! │                              ▼                                          │
//! │   clamp accumulated to [0, cost - salvage], round to cents             │
//! │   book_value = max(cost - accumulated, salvage)                        │
//! │   remaining  = max(0, ceil(life × 12) - months_owned)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Method math runs on unrounded `Decimal`; only `accumulated` and
//! `monthly` are rounded, once, on the way out.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use ts_rs::TS;

use crate::dates::{months_owned, AccountingPeriod};
use crate::error::{CoreError, CoreResult};
use crate::ledger::{self, NewLedgerEntry};
use crate::money::Money;
use crate::types::{DepreciationMethod, DisposalRequest, FixedAsset};
use crate::validation::{validate_depreciation_terms, validate_non_negative_amount};

const MONTHS_PER_YEAR: Decimal = dec!(12);

// =============================================================================
// Inputs & Outputs
// =============================================================================

/// The subset of an asset that drives its depreciation.
#[derive(Debug, Clone, PartialEq)]
pub struct DepreciationTerms {
    pub acquisition_date: DateTime<Utc>,
    pub acquisition_cost: Money,
    pub salvage_value: Money,
    pub useful_life_years: Decimal,
    pub method: DepreciationMethod,
    pub depreciation_rate: Option<Decimal>,
}

impl From<&FixedAsset> for DepreciationTerms {
    fn from(asset: &FixedAsset) -> Self {
        DepreciationTerms {
            acquisition_date: asset.acquisition_date,
            acquisition_cost: asset.acquisition_cost,
            salvage_value: asset.salvage_value,
            useful_life_years: asset.useful_life_years,
            method: asset.depreciation_method,
            depreciation_rate: asset.depreciation_rate,
        }
    }
}

/// Depreciation state of an asset at an as-of instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct DepreciationSnapshot {
    pub accumulated: Money,
    pub book_value: Money,
    /// Charge for the month following `as_of`.
    pub monthly: Money,
    #[ts(type = "number")]
    pub remaining_months: i64,
    #[ts(type = "number")]
    pub months_owned: i64,
    pub fully_depreciated: bool,
}

/// Unrounded method output.
struct MethodResult {
    accumulated: Decimal,
    monthly: Decimal,
}

/// Shared inputs for the per-method functions.
struct MethodInput {
    cost: Decimal,
    salvage: Decimal,
    depreciable: Decimal,
    life_years: Decimal,
    total_months: Decimal,
    months_owned: i64,
}

// =============================================================================
// Calculator
// =============================================================================

/// Depreciation state of `asset` at `as_of`.
pub fn calculate_depreciation(
    asset: &FixedAsset,
    as_of: DateTime<Utc>,
) -> CoreResult<DepreciationSnapshot> {
    calculate(&DepreciationTerms::from(asset), as_of)
}

/// Depreciation state for raw terms at `as_of`.
///
/// ## Errors
/// `CoreError::Validation` for non-positive cost or life, negative salvage,
/// salvage above cost, an explicit rate <= 0, or a life or rate above its
/// upper bound.
pub fn calculate(terms: &DepreciationTerms, as_of: DateTime<Utc>) -> CoreResult<DepreciationSnapshot> {
    validate_depreciation_terms(
        terms.acquisition_cost,
        terms.salvage_value,
        terms.useful_life_years,
        terms.method,
        terms.depreciation_rate,
    )?;

    let cost = terms.acquisition_cost.to_decimal();
    let salvage = terms.salvage_value.to_decimal();
    let owned = months_owned(terms.acquisition_date, as_of);

    let input = MethodInput {
        cost,
        salvage,
        depreciable: cost - salvage,
        life_years: terms.useful_life_years,
        total_months: terms.useful_life_years * MONTHS_PER_YEAR,
        months_owned: owned,
    };

    let raw = match terms.method {
        // Unit counts are not tracked, so usage-based assets fall back to time.
        DepreciationMethod::StraightLine | DepreciationMethod::UnitsOfProduction => {
            straight_line(&input)
        }
        DepreciationMethod::DecliningBalance => {
            let rate = terms
                .depreciation_rate
                .unwrap_or_else(|| dec!(2) / input.life_years);
            declining_balance(&input, rate)
        }
        DepreciationMethod::SumOfYears => sum_of_years(&input),
    };

    let accumulated = Money::from_decimal(raw.accumulated.max(Decimal::ZERO).min(input.depreciable));
    let monthly = Money::from_decimal(raw.monthly.max(Decimal::ZERO));
    let book_value = (terms.acquisition_cost - accumulated).max(terms.salvage_value);

    let life_months = input.total_months.ceil().to_i64().unwrap_or(i64::MAX);
    let remaining_months = (life_months - owned).max(0);

    Ok(DepreciationSnapshot {
        accumulated,
        book_value,
        monthly,
        remaining_months,
        months_owned: owned,
        fully_depreciated: book_value <= terms.salvage_value,
    })
}

/// Equal charge every month: `(cost - salvage) / (life × 12)`.
fn straight_line(input: &MethodInput) -> MethodResult {
    let monthly = input.depreciable / input.total_months;
    let accumulated = (monthly * Decimal::from(input.months_owned)).min(input.depreciable);
    MethodResult {
        accumulated,
        monthly,
    }
}

/// Applies `rate / 12` to the running book value one month at a time.
///
/// The month that would push book value below salvage only takes the
/// remainder down to salvage, and nothing is charged after it.
fn declining_balance(input: &MethodInput, rate: Decimal) -> MethodResult {
    let monthly_rate = rate / MONTHS_PER_YEAR;
    let life_months = input.total_months.ceil().to_i64().unwrap_or(i64::MAX);
    let periods = input.months_owned.min(life_months);

    let mut book = input.cost;
    let mut accumulated = Decimal::ZERO;

    for _ in 0..periods {
        let charge = book * monthly_rate;
        if book - charge < input.salvage {
            accumulated += book - input.salvage;
            break;
        }
        accumulated += charge;
        book -= charge;
    }

    MethodResult {
        accumulated,
        monthly: (input.cost - accumulated) * monthly_rate,
    }
}

/// Sum-of-years'-digits: year `k` of `n` carries weight `(n - k + 1) / (n(n+1)/2)`.
///
/// Completed years take their full weight; the year in progress takes the
/// elapsed fraction. `monthly` is the charge rate of the year the next month
/// falls in, and zero once the life is over.
fn sum_of_years(input: &MethodInput) -> MethodResult {
    let n = input.life_years;
    let digits_total = n * (n + Decimal::ONE) / dec!(2);
    let years_owned = Decimal::from(input.months_owned) / MONTHS_PER_YEAR;
    let whole_years = years_owned.floor();
    let partial = years_owned - whole_years;

    let weight = |year: Decimal| input.depreciable * (n - year + Decimal::ONE) / digits_total;

    let mut accumulated = Decimal::ZERO;
    let mut year = Decimal::ONE;
    while year <= years_owned.ceil() && year <= n {
        let fraction = if year <= years_owned { Decimal::ONE } else { partial };
        accumulated += weight(year) * fraction;
        year += Decimal::ONE;
    }

    let current_year = whole_years + Decimal::ONE;
    let monthly = if current_year <= n {
        weight(current_year) / MONTHS_PER_YEAR
    } else {
        Decimal::ZERO
    };

    MethodResult {
        accumulated,
        monthly,
    }
}

// =============================================================================
// Period Runs
// =============================================================================

/// One asset's line in a period run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct PlannedDepreciation {
    pub asset_id: String,
    pub asset_name: String,
    pub depreciation_amount: Money,
    pub accumulated_after: Money,
    pub book_value_after: Money,
}

/// Everything a period run will post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct PeriodDepreciationPlan {
    #[ts(as = "String")]
    pub period: AccountingPeriod,
    #[ts(as = "String")]
    pub period_start: chrono::NaiveDate,
    #[ts(as = "String")]
    pub period_end: chrono::NaiveDate,
    pub entries: Vec<PlannedDepreciation>,
    pub total_depreciation: Money,
}

/// Plans the depreciation charges for `period`, evaluated at its last instant.
///
/// Skips disposed assets, assets acquired after the period, and assets
/// already at salvage. Each charge is `min(monthly, book_value - salvage)`.
pub fn plan_period_depreciation(
    assets: &[FixedAsset],
    period: AccountingPeriod,
) -> CoreResult<PeriodDepreciationPlan> {
    let as_of = period.end_instant();
    let mut entries = Vec::new();

    for asset in assets {
        if !asset.is_active() || asset.acquisition_date > as_of {
            continue;
        }

        let snapshot = calculate_depreciation(asset, as_of)?;
        let headroom = snapshot.book_value - asset.salvage_value;
        if !headroom.is_positive() {
            continue;
        }

        let amount = snapshot.monthly.min(headroom);
        if !amount.is_positive() {
            continue;
        }

        entries.push(PlannedDepreciation {
            asset_id: asset.id.clone(),
            asset_name: asset.name.clone(),
            depreciation_amount: amount,
            accumulated_after: snapshot.accumulated + amount,
            book_value_after: snapshot.book_value - amount,
        });
    }

    let total_depreciation = entries.iter().map(|e| e.depreciation_amount).sum();

    Ok(PeriodDepreciationPlan {
        period,
        period_start: period.start_date(),
        period_end: period.end_date(),
        entries,
        total_depreciation,
    })
}

// =============================================================================
// Disposal
// =============================================================================

/// Outcome of disposing an asset, before it is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DisposalPlan {
    pub snapshot: DepreciationSnapshot,
    pub book_value_at_disposal: Money,
    pub accumulated_depreciation: Money,
    /// Proceeds minus book value; negative is a loss.
    pub gain_loss: Money,
    pub ledger_lines: Vec<NewLedgerEntry>,
}

/// Plans the disposal of `asset` at the request's disposal date.
///
/// ## Errors
/// - `InvalidAssetStatus` when the asset is already disposed
/// - `Validation` for negative proceeds or a disposal before acquisition
pub fn plan_disposal(
    asset: &FixedAsset,
    request: &DisposalRequest,
    disposal_id: &str,
) -> CoreResult<DisposalPlan> {
    if !asset.is_active() {
        return Err(CoreError::InvalidAssetStatus {
            asset_id: asset.id.clone(),
            status: asset.status.as_str().to_string(),
        });
    }

    validate_non_negative_amount("disposal_amount", request.disposal_amount)?;
    if request.disposal_date < asset.acquisition_date {
        return Err(crate::error::ValidationError::InvalidDateRange {
            start_field: "acquisition_date".to_string(),
            end_field: "disposal_date".to_string(),
        }
        .into());
    }

    let snapshot = calculate_depreciation(asset, request.disposal_date)?;
    let gain_loss = request.disposal_amount - snapshot.book_value;

    let ledger_lines = ledger::disposal_entries(
        asset,
        disposal_id,
        request.disposal_date,
        snapshot.accumulated,
        request.disposal_amount,
        gain_loss,
    );

    Ok(DisposalPlan {
        snapshot,
        book_value_at_disposal: snapshot.book_value,
        accumulated_depreciation: snapshot.accumulated,
        gain_loss,
        ledger_lines,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
