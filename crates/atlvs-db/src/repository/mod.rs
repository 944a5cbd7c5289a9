//! # Repository Module
//!
//! Database repository implementations for the finance record store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  FinanceStore (store.rs)                                               │
//! │       │                                                                 │
//! │       │  db.revenue().recognize(id, &request, date)                    │
//! │       ▼                                                                 │
//! │  RevenueRepository                                                     │
//! │  ├── create_schedule(&self, input)                                     │
//! │  ├── recognize(&self, id, request, date)  ← one transaction            │
//! │  └── cancel(&self, id)                                                 │
//! │       │                                                                 │
//! │       │  SQL (query_as + FromRow row types)                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Row types hold raw columns (cents, TEXT decimals); TryFrom turns      │
//! │  them into atlvs-core types at the boundary.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`asset::AssetRepository`] - Fixed asset register
//! - [`depreciation::DepreciationRepository`] - Period runs, entries and disposals
//! - [`revenue::RevenueRepository`] - Schedules, milestones, recognitions
//! - [`ledger::LedgerRepository`] - Append-only general ledger

use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

pub mod asset;
pub mod depreciation;
pub mod ledger;
pub mod revenue;

/// Generates a new record ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Reads a TEXT decimal column.
pub(crate) fn parse_decimal(column: &str, value: &str) -> DbResult<Decimal> {
    Decimal::from_str(value).map_err(|_| DbError::corrupt(column, value))
}

pub(crate) fn parse_decimal_opt(column: &str, value: Option<&str>) -> DbResult<Option<Decimal>> {
    value.map(|v| parse_decimal(column, v)).transpose()
}
