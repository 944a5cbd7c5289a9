//! # Fixed Asset Service
//!
//! Read models and write operations behind `/api/fixed-assets`.
//!
//! ## Where Depreciation Comes From
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Stored:   fixed_assets (terms only), depreciation_entries (posted)     │
//! │                                                                         │
//! │  Derived:  calculate_depreciation(asset, as_of)                         │
//! │              ├── asset views, by-category, totals                       │
//! │              ├── current status on the asset history screen             │
//! │              └── register book values                                   │
//! │                                                                         │
//! │  as_of is resolved once at the HTTP boundary and passed down.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use atlvs_core::depreciation::{calculate_depreciation, DepreciationSnapshot};
use atlvs_core::reporting::{
    asset_totals, assets_by_category, depreciation_schedule_report, disposal_summary,
    fixed_asset_summary, AssetTotals, CategoryTotals, DepreciationScheduleReport, DisposalSummary,
    FixedAssetSummary,
};
use atlvs_core::{
    AccountingPeriod, AssetCategory, AssetDisposal, AssetStatus, DepreciationEntry,
    DepreciationMethod, DisposalRequest, FixedAsset, Money, NewFixedAsset,
};
use atlvs_db::{AssetFilter, DbResult, FinanceStore};

// =============================================================================
// Response Models
// =============================================================================

/// An asset with its depreciation at the request's as-of instant.
#[derive(Debug, Clone, Serialize)]
pub struct AssetView {
    #[serde(flatten)]
    pub asset: FixedAsset,
    pub depreciation: DepreciationSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetOverview {
    pub assets: Vec<AssetView>,
    pub by_category: BTreeMap<AssetCategory, CategoryTotals>,
    pub totals: AssetTotals,
}

/// Posted history plus the live figures for one asset.
#[derive(Debug, Clone, Serialize)]
pub struct AssetDepreciation {
    pub asset: FixedAsset,
    /// Newest period first.
    pub entries: Vec<DepreciationEntry>,
    pub current_status: DepreciationSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterLine {
    pub asset_id: String,
    pub asset_number: String,
    pub name: String,
    pub category: AssetCategory,
    pub acquisition_date: DateTime<Utc>,
    pub acquisition_cost: Money,
    pub salvage_value: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub useful_life_years: Decimal,
    pub depreciation_method: DepreciationMethod,
    pub accumulated_depreciation: Money,
    pub book_value: Money,
    pub status: AssetStatus,
    pub disposal_date: Option<DateTime<Utc>>,
    pub disposal_amount: Option<Money>,
    pub gain_loss: Option<Money>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisposalReport {
    pub disposals: Vec<AssetDisposal>,
    pub summary: DisposalSummary,
}

/// Result of a period run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub period: AccountingPeriod,
    pub assets_depreciated: usize,
    pub total_depreciation: Money,
    pub entries: Vec<DepreciationEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisposalOutcome {
    pub disposal: AssetDisposal,
    pub gain_loss: Money,
}

// =============================================================================
// Reads
// =============================================================================

/// Active asset count and cost.
pub async fn summary(store: &dyn FinanceStore) -> DbResult<FixedAssetSummary> {
    let assets = store.list_assets(&AssetFilter::default()).await?;
    Ok(fixed_asset_summary(&assets))
}

/// Active assets (optionally one category) valued at `as_of`.
pub async fn overview(
    store: &dyn FinanceStore,
    category: Option<AssetCategory>,
    as_of: DateTime<Utc>,
) -> DbResult<AssetOverview> {
    let filter = AssetFilter {
        category,
        ..AssetFilter::active()
    };
    let valued = valued_assets(store.list_assets(&filter).await?, as_of)?;

    Ok(AssetOverview {
        by_category: assets_by_category(&valued),
        totals: asset_totals(&valued),
        assets: valued
            .into_iter()
            .map(|(asset, depreciation)| AssetView {
                asset,
                depreciation,
            })
            .collect(),
    })
}

/// Posted entries and the live snapshot for one asset.
///
/// A disposed asset is valued at its disposal date rather than `as_of`.
pub async fn asset_depreciation(
    store: &dyn FinanceStore,
    asset_id: &str,
    as_of: DateTime<Utc>,
) -> DbResult<AssetDepreciation> {
    let asset = store.get_asset(asset_id).await?;
    let mut entries = store.depreciation_history(asset_id).await?;
    entries.reverse();

    let valued_at = asset.disposal_date.map_or(as_of, |d| d.min(as_of));
    let current_status = calculate_depreciation(&asset, valued_at)?;

    Ok(AssetDepreciation {
        asset,
        entries,
        current_status,
    })
}

/// Schedule for `period`, valued at the period's last instant.
pub async fn period_schedule(
    store: &dyn FinanceStore,
    period: AccountingPeriod,
    category: Option<AssetCategory>,
) -> DbResult<DepreciationScheduleReport> {
    let filter = AssetFilter {
        category,
        ..AssetFilter::active()
    };
    let assets = store.list_assets(&filter).await?;
    let valued = valued_assets(
        assets
            .into_iter()
            .filter(|a| a.acquisition_date <= period.end_instant())
            .collect(),
        period.end_instant(),
    )?;
    Ok(depreciation_schedule_report(period, &valued))
}

/// Every asset in asset-number order, disposed ones with their recorded
/// disposal figures.
pub async fn register(store: &dyn FinanceStore, as_of: DateTime<Utc>) -> DbResult<Vec<RegisterLine>> {
    let assets = store.list_assets(&AssetFilter::default()).await?;
    let disposals: HashMap<String, AssetDisposal> = store
        .list_disposals()
        .await?
        .into_iter()
        .map(|d| (d.asset_id.clone(), d))
        .collect();

    assets
        .into_iter()
        .map(|asset| -> DbResult<RegisterLine> {
            let disposal = disposals.get(&asset.id);
            let (accumulated, book_value) = match disposal {
                Some(d) => (d.accumulated_depreciation, d.book_value_at_disposal),
                None => {
                    let snapshot = calculate_depreciation(&asset, as_of)?;
                    (snapshot.accumulated, snapshot.book_value)
                }
            };

            Ok(RegisterLine {
                asset_id: asset.id,
                asset_number: asset.asset_number,
                name: asset.name,
                category: asset.category,
                acquisition_date: asset.acquisition_date,
                acquisition_cost: asset.acquisition_cost,
                salvage_value: asset.salvage_value,
                useful_life_years: asset.useful_life_years,
                depreciation_method: asset.depreciation_method,
                accumulated_depreciation: accumulated,
                book_value,
                status: asset.status,
                disposal_date: disposal.map(|d| d.disposal_date),
                disposal_amount: disposal.map(|d| d.disposal_amount),
                gain_loss: disposal.map(|d| d.gain_loss),
            })
        })
        .collect()
}

pub async fn disposals(store: &dyn FinanceStore) -> DbResult<DisposalReport> {
    let disposals = store.list_disposals().await?;
    Ok(DisposalReport {
        summary: disposal_summary(&disposals),
        disposals,
    })
}

fn valued_assets(
    assets: Vec<FixedAsset>,
    as_of: DateTime<Utc>,
) -> DbResult<Vec<(FixedAsset, DepreciationSnapshot)>> {
    assets
        .into_iter()
        .map(|asset| -> DbResult<(FixedAsset, DepreciationSnapshot)> {
            let snapshot = calculate_depreciation(&asset, as_of)?;
            Ok((asset, snapshot))
        })
        .collect()
}

// =============================================================================
// Writes
// =============================================================================

pub async fn create_asset(store: &dyn FinanceStore, input: &NewFixedAsset) -> DbResult<FixedAsset> {
    let asset = store.create_asset(input).await?;
    info!(asset_id = %asset.id, asset_number = %asset.asset_number, "Asset registered");
    Ok(asset)
}

/// Posts the run for `period`; a second call for the same period fails
/// with `DuplicatePeriod` and writes nothing.
pub async fn record_depreciation(
    store: &dyn FinanceStore,
    period: AccountingPeriod,
) -> DbResult<RunReport> {
    let run = store.record_depreciation(period).await?;
    info!(
        period = %period,
        assets = run.entries.len(),
        total = %run.total_depreciation,
        "Depreciation recorded"
    );

    Ok(RunReport {
        period: run.period,
        assets_depreciated: run.entries.len(),
        total_depreciation: run.total_depreciation,
        entries: run.entries,
    })
}

pub async fn dispose(
    store: &dyn FinanceStore,
    asset_id: &str,
    request: &DisposalRequest,
) -> DbResult<DisposalOutcome> {
    let disposal = store.dispose_asset(asset_id, request).await?;
    info!(
        asset_id = %asset_id,
        disposal_id = %disposal.id,
        gain_loss = %disposal.gain_loss,
        "Asset disposed"
    );

    Ok(DisposalOutcome {
        gain_loss: disposal.gain_loss,
        disposal,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{memory_store, new_asset, utc};
    use atlvs_core::DisposalMethod;

    #[tokio::test]
    async fn test_overview_values_at_as_of() {
        let store = memory_store().await;
        // $12,000 over 5 years, straight line, acquired 2024-01-01
        store.create_asset(&new_asset("Console", 1_200_000)).await.unwrap();
        store.create_asset(&new_asset("Truss", 600_000)).await.unwrap();

        let as_of = utc(2024, 1, 1) + chrono::Duration::days(914);
        let overview = overview(store.as_ref(), None, as_of).await.unwrap();

        assert_eq!(overview.assets.len(), 2);
        let console = overview
            .assets
            .iter()
            .find(|v| v.asset.name == "Console")
            .unwrap();
        assert_eq!(console.depreciation.monthly, Money::from_cents(20_000));
        assert_eq!(console.depreciation.accumulated, Money::from_cents(600_000));
        assert_eq!(console.depreciation.remaining_months, 30);

        assert_eq!(overview.totals.total_cost, Money::from_cents(1_800_000));
        assert_eq!(
            overview.totals.total_book_value + overview.totals.total_accumulated_depreciation,
            overview.totals.total_cost
        );
        assert_eq!(overview.by_category[&AssetCategory::Equipment].count, 2);
    }

    #[tokio::test]
    async fn test_run_then_history_newest_first() {
        let store = memory_store().await;
        let asset = store.create_asset(&new_asset("Console", 1_200_000)).await.unwrap();

        for month in 1..=3 {
            let period = AccountingPeriod::new(2024, month).unwrap();
            let report = record_depreciation(store.as_ref(), period).await.unwrap();
            assert_eq!(report.assets_depreciated, 1);
        }

        let history = asset_depreciation(store.as_ref(), &asset.id, utc(2024, 4, 1))
            .await
            .unwrap();
        assert_eq!(history.entries.len(), 3);
        assert!(history.entries[0].period_start > history.entries[2].period_start);
        assert_eq!(history.asset.depreciation_method, DepreciationMethod::StraightLine);
    }

    #[tokio::test]
    async fn test_register_uses_recorded_disposal() {
        let store = memory_store().await;
        let sold = store.create_asset(&new_asset("Generator", 1_000_000)).await.unwrap();
        store.create_asset(&new_asset("Truss", 600_000)).await.unwrap();

        let request = DisposalRequest {
            disposal_date: utc(2025, 1, 1),
            disposal_method: DisposalMethod::Sale,
            disposal_amount: Money::from_cents(900_000),
            disposal_reason: None,
            buyer_info: None,
        };
        let outcome = dispose(store.as_ref(), &sold.id, &request).await.unwrap();
        assert_eq!(outcome.gain_loss, outcome.disposal.gain_loss);

        let lines = register(store.as_ref(), utc(2026, 1, 1)).await.unwrap();
        assert_eq!(lines.len(), 2);
        let line = lines.iter().find(|l| l.asset_id == sold.id).unwrap();
        assert_eq!(line.status, AssetStatus::Disposed);
        assert_eq!(line.book_value, outcome.disposal.book_value_at_disposal);
        assert_eq!(line.gain_loss, Some(outcome.gain_loss));

        let report = disposals(store.as_ref()).await.unwrap();
        assert_eq!(report.summary.total_disposed, 1);
        assert_eq!(report.summary.total_proceeds, Money::from_cents(900_000));

        // disposed assets leave the landing-page summary
        let headline = summary(store.as_ref()).await.unwrap();
        assert_eq!(headline.total_assets, 1);
    }

    #[tokio::test]
    async fn test_period_schedule_skips_later_acquisitions() {
        let store = memory_store().await;
        store.create_asset(&new_asset("Console", 1_200_000)).await.unwrap();
        let mut later = new_asset("Truss", 600_000);
        later.acquisition_date = utc(2024, 9, 1);
        store.create_asset(&later).await.unwrap();

        let report = period_schedule(store.as_ref(), AccountingPeriod::new(2024, 6).unwrap(), None)
            .await
            .unwrap();
        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.total_period_depreciation, Money::from_cents(20_000));
    }
}
