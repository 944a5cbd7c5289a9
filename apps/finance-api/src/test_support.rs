//! Fixtures for service and router tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use atlvs_core::{
    AssetCategory, DepreciationMethod, Money, NewDeferredRevenueSchedule, NewFixedAsset,
    RecognitionMethod,
};
use atlvs_db::{Database, DbConfig, FinanceStore};

use crate::config::ApiConfig;
use crate::state::AppState;

pub(crate) fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub(crate) async fn memory_store() -> Arc<dyn FinanceStore> {
    Arc::new(Database::new(DbConfig::in_memory()).await.unwrap())
}

pub(crate) async fn memory_state() -> AppState {
    AppState::new(memory_store().await, ApiConfig::default())
}

/// Five-year straight-line equipment acquired 2024-01-01, no salvage.
pub(crate) fn new_asset(name: &str, cost_cents: i64) -> NewFixedAsset {
    NewFixedAsset {
        name: name.to_string(),
        category: AssetCategory::Equipment,
        description: None,
        acquisition_date: utc(2024, 1, 1),
        acquisition_cost: Money::from_cents(cost_cents),
        salvage_value: Money::zero(),
        useful_life_years: Decimal::from(5),
        depreciation_method: DepreciationMethod::StraightLine,
        depreciation_rate: None,
        location: None,
        serial_number: None,
        notes: None,
    }
}

/// Straight-line schedule over calendar 2024.
pub(crate) fn new_schedule(client_id: &str, total_cents: i64) -> NewDeferredRevenueSchedule {
    NewDeferredRevenueSchedule {
        client_id: client_id.to_string(),
        project_id: None,
        contract_id: None,
        invoice_id: None,
        total_amount: Money::from_cents(total_cents),
        currency: None,
        recognition_method: RecognitionMethod::StraightLine,
        start_date: utc(2024, 1, 1),
        end_date: utc(2024, 12, 31),
        description: None,
        milestones: Vec::new(),
    }
}
