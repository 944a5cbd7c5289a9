//! # Reporting Module
//!
//! Read-side folds behind the summary screens. Every function takes an
//! explicit slice and returns a fresh value; sums are exact because inputs
//! are already whole cents.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use ts_rs::TS;

use crate::dates::{AccountingPeriod, MonthKey};
use crate::depreciation::DepreciationSnapshot;
use crate::money::Money;
use crate::types::{
    AssetCategory, AssetDisposal, DeferredRevenueSchedule, FixedAsset, RecognitionEvent,
    ScheduleStatus,
};

// =============================================================================
// Fixed Assets
// =============================================================================

/// Per-category roll-up of the register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct CategoryTotals {
    #[ts(type = "number")]
    pub count: u64,
    pub cost: Money,
    pub book_value: Money,
    pub accumulated: Money,
}

/// Register-wide totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct AssetTotals {
    pub total_cost: Money,
    pub total_book_value: Money,
    pub total_accumulated_depreciation: Money,
}

/// Groups assets with their snapshots by category.
pub fn assets_by_category(
    items: &[(FixedAsset, DepreciationSnapshot)],
) -> BTreeMap<AssetCategory, CategoryTotals> {
    items
        .iter()
        .fold(BTreeMap::new(), |mut acc, (asset, snapshot)| {
            let entry: &mut CategoryTotals = acc.entry(asset.category).or_default();
            entry.count += 1;
            entry.cost += asset.acquisition_cost;
            entry.book_value += snapshot.book_value;
            entry.accumulated += snapshot.accumulated;
            acc
        })
}

/// Totals across all given assets.
pub fn asset_totals(items: &[(FixedAsset, DepreciationSnapshot)]) -> AssetTotals {
    items
        .iter()
        .fold(AssetTotals::default(), |mut acc, (asset, snapshot)| {
            acc.total_cost += asset.acquisition_cost;
            acc.total_book_value += snapshot.book_value;
            acc.total_accumulated_depreciation += snapshot.accumulated;
            acc
        })
}

/// The `n` most expensive assets, ties broken by asset number.
pub fn top_assets_by_cost(assets: &[FixedAsset], n: usize) -> Vec<&FixedAsset> {
    let mut sorted: Vec<&FixedAsset> = assets.iter().collect();
    sorted.sort_by(|a, b| {
        b.acquisition_cost
            .cmp(&a.acquisition_cost)
            .then_with(|| a.asset_number.cmp(&b.asset_number))
    });
    sorted.truncate(n);
    sorted
}

/// Headline numbers for the fixed assets landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct FixedAssetSummary {
    #[ts(type = "number")]
    pub total_assets: u64,
    pub total_acquisition_cost: Money,
    pub categories: Vec<AssetCategory>,
}

/// Active asset count, their cost, and the distinct categories in use.
pub fn fixed_asset_summary(assets: &[FixedAsset]) -> FixedAssetSummary {
    let active: Vec<&FixedAsset> = assets.iter().filter(|a| a.is_active()).collect();
    let categories: BTreeSet<AssetCategory> = active.iter().map(|a| a.category).collect();

    FixedAssetSummary {
        total_assets: active.len() as u64,
        total_acquisition_cost: active.iter().map(|a| a.acquisition_cost).sum(),
        categories: categories.into_iter().collect(),
    }
}

/// Totals over recorded disposals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct DisposalSummary {
    #[ts(type = "number")]
    pub total_disposed: u64,
    pub total_proceeds: Money,
    pub net_gain_loss: Money,
}

pub fn disposal_summary(disposals: &[AssetDisposal]) -> DisposalSummary {
    disposals
        .iter()
        .fold(DisposalSummary::default(), |mut acc, d| {
            acc.total_disposed += 1;
            acc.total_proceeds += d.disposal_amount;
            acc.net_gain_loss += d.gain_loss;
            acc
        })
}

/// One asset's line in a period depreciation schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ScheduleLine {
    pub asset_id: String,
    pub asset_number: String,
    pub name: String,
    pub category: AssetCategory,
    pub acquisition_cost: Money,
    pub snapshot: DepreciationSnapshot,
}

/// Depreciation schedule for one period, as shown on the schedule screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct DepreciationScheduleReport {
    #[ts(as = "String")]
    pub period: AccountingPeriod,
    pub lines: Vec<ScheduleLine>,
    /// Sum of `monthly` over assets not yet fully depreciated.
    pub total_period_depreciation: Money,
    pub total_book_value: Money,
}

pub fn depreciation_schedule_report(
    period: AccountingPeriod,
    items: &[(FixedAsset, DepreciationSnapshot)],
) -> DepreciationScheduleReport {
    let lines: Vec<ScheduleLine> = items
        .iter()
        .map(|(asset, snapshot)| ScheduleLine {
            asset_id: asset.id.clone(),
            asset_number: asset.asset_number.clone(),
            name: asset.name.clone(),
            category: asset.category,
            acquisition_cost: asset.acquisition_cost,
            snapshot: *snapshot,
        })
        .collect();

    let total_period_depreciation = lines
        .iter()
        .filter(|l| !l.snapshot.fully_depreciated)
        .map(|l| l.snapshot.monthly)
        .sum();
    let total_book_value = lines.iter().map(|l| l.snapshot.book_value).sum();

    DepreciationScheduleReport {
        period,
        lines,
        total_period_depreciation,
        total_book_value,
    }
}

// =============================================================================
// Deferred Revenue
// =============================================================================

/// Recognized amounts bucketed by the month of their recognition date.
pub fn recognitions_by_month(events: &[RecognitionEvent]) -> BTreeMap<MonthKey, Money> {
    events.iter().fold(BTreeMap::new(), |mut acc, event| {
        *acc.entry(MonthKey::of(event.recognition_date)).or_default() += event.amount;
        acc
    })
}

/// Events whose recognition date falls in `[start, end]`.
pub fn recognitions_between(
    events: &[RecognitionEvent],
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Vec<RecognitionEvent> {
    events
        .iter()
        .filter(|e| start.map_or(true, |s| e.recognition_date >= s))
        .filter(|e| end.map_or(true, |t| e.recognition_date <= t))
        .cloned()
        .collect()
}

/// Headline numbers for the deferred revenue landing page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct RevenueSummary {
    pub total_deferred: Money,
    pub total_recognized: Money,
    pub remaining_balance: Money,
    #[ts(type = "number")]
    pub schedule_count: u64,
}

/// Totals over non-cancelled schedules and their recognitions.
pub fn revenue_summary(
    schedules: &[DeferredRevenueSchedule],
    events: &[RecognitionEvent],
) -> RevenueSummary {
    let live: BTreeSet<&str> = schedules
        .iter()
        .filter(|s| s.status != ScheduleStatus::Cancelled)
        .map(|s| s.id.as_str())
        .collect();

    let total_deferred: Money = schedules
        .iter()
        .filter(|s| live.contains(s.id.as_str()))
        .map(|s| s.total_amount)
        .sum();
    let total_recognized: Money = events
        .iter()
        .filter(|e| live.contains(e.schedule_id.as_str()))
        .map(|e| e.amount)
        .sum();

    RevenueSummary {
        total_deferred,
        total_recognized,
        remaining_balance: total_deferred - total_recognized,
        schedule_count: live.len() as u64,
    }
}

/// Recognized-to-date per schedule id.
pub fn recognized_by_schedule(events: &[RecognitionEvent]) -> BTreeMap<String, Money> {
    events.iter().fold(BTreeMap::new(), |mut acc, e| {
        *acc.entry(e.schedule_id.clone()).or_default() += e.amount;
        acc
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
