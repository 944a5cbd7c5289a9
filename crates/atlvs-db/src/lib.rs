//! # atlvs-db: Record Store for the ATLVS Finance Engine
//!
//! SQLite storage for fixed assets, depreciation runs, disposals, deferred
//! revenue schedules, recognition events and the general ledger, using
//! sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ATLVS Finance Data Flow                          │
//! │                                                                         │
//! │  finance-api handler (POST /api/deferred-revenue/{id}/recognitions)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     atlvs-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ FinanceStore  │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (store.rs)   │───►│ asset.rs      │    │  (embedded)  │  │   │
//! │  │   │               │    │ depreciation  │    │              │  │   │
//! │  │   │  Database     │    │ revenue.rs    │    │ 0001_finance │  │   │
//! │  │   │  (pool.rs)    │    │ ledger.rs     │    │   _schema    │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`store`] - The `FinanceStore` trait the HTTP layer depends on
//!
//! ## Usage
//!
//! ```rust,ignore
//! use atlvs_db::{Database, DbConfig, FinanceStore};
//!
//! let db = Database::new(DbConfig::new("./data/atlvs-finance.db")).await?;
//! let event = db.recognize(&schedule_id, &request, as_of).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::FinanceStore;

// Repository re-exports for convenience
pub use repository::asset::{AssetFilter, AssetRepository};
pub use repository::depreciation::{DepreciationRepository, RecordedRun};
pub use repository::ledger::{LedgerFilter, LedgerRepository};
pub use repository::revenue::{RecognitionFilter, RevenueRepository, ScheduleDetail, ScheduleFilter};
