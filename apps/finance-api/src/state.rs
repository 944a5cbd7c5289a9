//! # Application State
//!
//! Shared by every handler through axum's `State` extractor.
//!
//! The store sits behind `Arc<dyn FinanceStore>` so handlers never name
//! the SQLite type; tests hand in an in-memory `Database`.

use std::sync::Arc;

use atlvs_db::FinanceStore;

use crate::config::ApiConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FinanceStore>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn FinanceStore>, config: ApiConfig) -> Self {
        AppState {
            store,
            config: Arc::new(config),
        }
    }

    /// Forecast/waterfall window used when a request does not name one.
    pub fn default_report_months(&self) -> u32 {
        self.config.reports.forecast_months
    }
}
