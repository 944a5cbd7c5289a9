//! # ATLVS Finance API
//!
//! HTTP surface for fixed-asset depreciation and deferred revenue
//! recognition.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP ──► routes (extract + validate ids/dates, resolve as-of)          │
//! │              │                                                          │
//! │              ▼                                                          │
//! │           services (load records, run calculators, shape responses)     │
//! │              │                          │                               │
//! │              ▼                          ▼                               │
//! │      atlvs-db FinanceStore        atlvs-core calculators                │
//! │      (SQLite, transactions,       (depreciation, recognition,           │
//! │       ledger postings)             forecast, waterfall, reporting)      │
//! │                                                                         │
//! │  Failures on the way back out become ApiError JSON envelopes.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages
//! - `RUST_LOG=atlvs=trace` - Trace the ATLVS crates only
//! - Default: `info,atlvs=debug,sqlx=warn`

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;

use tracing_subscriber::EnvFilter;

pub use config::{ApiConfig, ConfigError, CONFIG_PATH_ENV};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::router;
pub use state::AppState;

/// Installs the global fmt subscriber, honouring `RUST_LOG` when set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,atlvs=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
