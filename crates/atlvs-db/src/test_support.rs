//! Fixtures shared by the repository and store tests.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;

use atlvs_core::{
    AssetCategory, DepreciationMethod, Money, NewDeferredRevenueSchedule, NewFixedAsset,
    RecognitionMethod,
};

use crate::{Database, DbConfig};

pub(crate) fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub(crate) async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// Five-year straight-line equipment acquired 2024-01-01.
pub(crate) fn new_asset(name: &str, cost_cents: i64) -> NewFixedAsset {
    NewFixedAsset {
        name: name.to_string(),
        category: AssetCategory::Equipment,
        description: None,
        acquisition_date: utc(2024, 1, 1),
        acquisition_cost: Money::from_cents(cost_cents),
        salvage_value: Money::zero(),
        useful_life_years: dec!(5),
        depreciation_method: DepreciationMethod::StraightLine,
        depreciation_rate: None,
        location: Some("Warehouse B".to_string()),
        serial_number: None,
        notes: None,
    }
}

/// Straight-line schedule for 2024 calendar year.
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
