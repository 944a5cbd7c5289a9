//! # Domain Types
//!
//! Records and enums shared by the calculators, the record store and the API.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌───────────────────┐   ┌─────────────────┐     │
//! │  │   FixedAsset    │   │ DepreciationEntry │   │  AssetDisposal  │     │
//! │  │  ─────────────  │   │  ───────────────  │   │  ─────────────  │     │
//! │  │  id (UUID)      │◄──│  asset_id (FK)    │   │  asset_id (FK)  │     │
//! │  │  asset_number   │   │  period_start/end │   │  gain_loss      │     │
//! │  │  cost, salvage  │   │  amount           │   │  book_value     │     │
//! │  └─────────────────┘   └───────────────────┘   └─────────────────┘     │
//! │                                                                         │
//! │  ┌───────────────────────┐   ┌─────────────────┐   ┌───────────────┐   │
//! │  │DeferredRevenueSchedule│   │    Milestone    │   │RecognitionEvt │   │
//! │  │  ───────────────────  │   │  ─────────────  │   │  ───────────  │   │
//! │  │  id (UUID)            │◄──│  schedule_id    │◄──│  milestone_id │   │
//! │  │  total_amount         │   │  percentage     │   │  schedule_id  │   │
//! │  │  start/end dates      │   │  sequence       │   │  amount       │   │
//! │  └───────────────────────┘   └─────────────────┘   └───────────────┘   │
//! │                                                                         │
//! │                      LedgerEntry (debit/credit, reference)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Assets have a UUID `id` for relations and a human-readable
//! `asset_number` (`FA-000042`) for the register.
//!
//! Recognized-to-date is never stored on a schedule. It is always the sum
//! of the schedule's recognition events.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Asset Category
// =============================================================================

/// Register category of a fixed asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Land,
    Buildings,
    Equipment,
    Vehicles,
    Furniture,
    Computers,
    LeaseholdImprovements,
    Intangible,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 8] = [
        AssetCategory::Land,
        AssetCategory::Buildings,
        AssetCategory::Equipment,
        AssetCategory::Vehicles,
        AssetCategory::Furniture,
        AssetCategory::Computers,
        AssetCategory::LeaseholdImprovements,
        AssetCategory::Intangible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Land => "land",
            AssetCategory::Buildings => "buildings",
            AssetCategory::Equipment => "equipment",
            AssetCategory::Vehicles => "vehicles",
            AssetCategory::Furniture => "furniture",
            AssetCategory::Computers => "computers",
            AssetCategory::LeaseholdImprovements => "leasehold_improvements",
            AssetCategory::Intangible => "intangible",
        }
    }
}

// =============================================================================
// Depreciation Method
// =============================================================================

/// How an asset's cost is spread over its useful life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DepreciationMethod {
    /// Equal monthly charge over the useful life.
    StraightLine,
    /// Fixed annual rate applied to the declining book value.
    DecliningBalance,
    /// Sum-of-years'-digits weighting.
    SumOfYears,
    /// Accepted for data compatibility; computed as straight-line.
    UnitsOfProduction,
}

impl Default for DepreciationMethod {
    fn default() -> Self {
        DepreciationMethod::StraightLine
    }
}

impl DepreciationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepreciationMethod::StraightLine => "straight_line",
            DepreciationMethod::DecliningBalance => "declining_balance",
            DepreciationMethod::SumOfYears => "sum_of_years",
            DepreciationMethod::UnitsOfProduction => "units_of_production",
        }
    }
}

// =============================================================================
// Asset Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Active,
    Disposed,
}

impl Default for AssetStatus {
    fn default() -> Self {
        AssetStatus::Active
    }
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Active => "active",
            AssetStatus::Disposed => "disposed",
        }
    }
}

// =============================================================================
// Disposal Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DisposalMethod {
    Sale,
    TradeIn,
    Scrap,
    Donation,
    Theft,
    WriteOff,
}

// =============================================================================
// Fixed Asset
// =============================================================================

/// A long-lived asset on the register.
///
/// Accumulated depreciation and book value are never stored here; they are
/// derived by [`crate::depreciation::calculate`] for a given as-of instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FixedAsset {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business identifier, `FA-` followed by six digits.
    pub asset_number: String,

    pub name: String,

    pub category: AssetCategory,

    pub description: Option<String>,

    #[ts(as = "String")]
    pub acquisition_date: DateTime<Utc>,

    /// Original cost, strictly positive.
    pub acquisition_cost: Money,

    /// Residual value at end of life, `0 <= salvage <= cost`.
    pub salvage_value: Money,

    /// Useful life in years (fractional lives are allowed for straight-line).
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub useful_life_years: Decimal,

    pub depreciation_method: DepreciationMethod,

    /// Annual rate for declining balance; defaults to `2 / life` when absent.
    #[serde(with = "rust_decimal::serde::float_option")]
    #[ts(type = "number | null")]
    pub depreciation_rate: Option<Decimal>,

    pub location: Option<String>,

    pub serial_number: Option<String>,

    pub notes: Option<String>,

    pub status: AssetStatus,

    #[ts(as = "Option<String>")]
    pub disposal_date: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl FixedAsset {
    /// Cost minus salvage: the total that will ever be depreciated.
    pub fn depreciable_base(&self) -> Money {
        self.acquisition_cost - self.salvage_value
    }

    pub fn is_active(&self) -> bool {
        self.status == AssetStatus::Active
    }
}

/// Input for registering a new asset.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewFixedAsset {
    pub name: String,

    pub category: AssetCategory,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(deserialize_with = "crate::dates::flexible::deserialize")]
    #[ts(as = "String")]
    pub acquisition_date: DateTime<Utc>,

    pub acquisition_cost: Money,

    #[serde(default)]
    pub salvage_value: Money,

    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub useful_life_years: Decimal,

    #[serde(default)]
    pub depreciation_method: DepreciationMethod,

    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[ts(type = "number | null")]
    pub depreciation_rate: Option<Decimal>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub serial_number: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

// =============================================================================
// Depreciation Entry
// =============================================================================

/// One asset's depreciation charge for one accounting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DepreciationEntry {
    pub id: String,

    pub asset_id: String,

    #[ts(as = "String")]
    pub period_start: chrono::NaiveDate,

    #[ts(as = "String")]
    pub period_end: chrono::NaiveDate,

    pub depreciation_amount: Money,

    pub accumulated_depreciation: Money,

    pub book_value: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Asset Disposal
// =============================================================================

/// Input for disposing of an asset.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct DisposalRequest {
    #[serde(deserialize_with = "crate::dates::flexible::deserialize")]
    #[ts(as = "String")]
    pub disposal_date: DateTime<Utc>,

    pub disposal_method: DisposalMethod,

    /// Proceeds received; zero for scrap, theft and write-off.
    #[serde(default)]
    pub disposal_amount: Money,

    #[serde(default)]
    pub disposal_reason: Option<String>,

    #[serde(default)]
    pub buyer_info: Option<String>,
}

/// Recorded disposal of an asset, with the book value it left at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AssetDisposal {
    pub id: String,

    pub asset_id: String,

    #[ts(as = "String")]
    pub disposal_date: DateTime<Utc>,

    pub disposal_method: DisposalMethod,

    pub disposal_amount: Money,

    pub disposal_reason: Option<String>,

    pub buyer_info: Option<String>,

    pub book_value_at_disposal: Money,

    pub accumulated_depreciation: Money,

    /// `disposal_amount - book_value_at_disposal`; negative is a loss.
    pub gain_loss: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Deferred Revenue
// =============================================================================

/// How a schedule's revenue is earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionMethod {
    /// Pro rata by elapsed days; the only method auto-recognition handles.
    StraightLine,
    Milestone,
    PercentageCompletion,
    Deliverable,
}

impl Default for RecognitionMethod {
    fn default() -> Self {
        RecognitionMethod::StraightLine
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Active,
    FullyRecognized,
    Cancelled,
}

impl Default for ScheduleStatus {
    fn default() -> Self {
        ScheduleStatus::Active
    }
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Active => "active",
            ScheduleStatus::FullyRecognized => "fully_recognized",
            ScheduleStatus::Cancelled => "cancelled",
        }
    }
}

/// Revenue invoiced up front and earned over `[start_date, end_date]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeferredRevenueSchedule {
    pub id: String,

    pub client_id: String,

    pub project_id: Option<String>,

    pub contract_id: Option<String>,

    pub invoice_id: Option<String>,

    /// Strictly positive.
    pub total_amount: Money,

    pub currency: String,

    pub recognition_method: RecognitionMethod,

    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,

    /// Strictly after `start_date`.
    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,

    pub description: Option<String>,

    pub status: ScheduleStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a schedule.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewDeferredRevenueSchedule {
    pub client_id: String,

    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub contract_id: Option<String>,

    #[serde(default)]
    pub invoice_id: Option<String>,

    pub total_amount: Money,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub recognition_method: RecognitionMethod,

    #[serde(deserialize_with = "crate::dates::flexible::deserialize")]
    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,

    #[serde(deserialize_with = "crate::dates::flexible::deserialize")]
    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub milestones: Vec<NewMilestone>,
}

// =============================================================================
// Milestones
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewMilestone {
    pub name: String,

    /// Share of the schedule total, 0-100.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub percentage: Decimal,

    #[serde(default, deserialize_with = "crate::dates::flexible::option::deserialize")]
    #[ts(as = "Option<String>")]
    pub target_date: Option<DateTime<Utc>>,
}

/// A named portion of a schedule, completed when revenue is recognized against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Milestone {
    pub id: String,

    pub schedule_id: String,

    pub name: String,

    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub percentage: Decimal,

    /// `total_amount × percentage / 100`, rounded to cents.
    pub amount: Money,

    #[ts(as = "Option<String>")]
    pub target_date: Option<DateTime<Utc>>,

    /// 1-based order within the schedule.
    pub sequence: i64,

    pub status: MilestoneStatus,

    #[ts(as = "Option<String>")]
    pub completed_date: Option<DateTime<Utc>>,
}

// =============================================================================
// Recognition
// =============================================================================

/// Input for recognizing part of a schedule.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct RecognitionRequest {
    pub amount: Money,

    /// Defaults to the request's as-of instant when omitted.
    #[serde(default, deserialize_with = "crate::dates::flexible::option::deserialize")]
    #[ts(as = "Option<String>")]
    pub recognition_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub milestone_id: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

/// Revenue moved from deferred to earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecognitionEvent {
    pub id: String,

    pub schedule_id: String,

    /// Strictly positive.
    pub amount: Money,

    #[ts(as = "String")]
    pub recognition_date: DateTime<Utc>,

    pub milestone_id: Option<String>,

    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Ledger
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Asset,
    ContraAsset,
    Expense,
    Revenue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    FixedAsset,
    Depreciation,
    Disposal,
    RevenueRecognition,
}

/// A posted general-ledger line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerEntry {
    pub id: String,

    #[ts(as = "String")]
    pub entry_date: DateTime<Utc>,

    pub description: String,

    pub debit: Money,

    pub credit: Money,

    pub account_type: AccountType,

    pub reference_type: ReferenceType,

    pub reference_id: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
