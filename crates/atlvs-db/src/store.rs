//! # Finance Store
//!
//! The record-store seam used by the HTTP layer.
//!
//! ```text
//! finance-api services ──► Arc<dyn FinanceStore> ──► Database (SQLite)
//!                                              └──► test doubles
//! ```
//!
//! Every write that must hold an invariant (recognition never exceeding a
//! schedule total, one run per period, one disposal per asset) is atomic
//! inside the implementation; callers never read-then-write across two
//! calls to enforce them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

use atlvs_core::depreciation::{plan_disposal, plan_period_depreciation};
use atlvs_core::{
    AccountingPeriod, AssetDisposal, DeferredRevenueSchedule, DepreciationEntry, DisposalRequest,
    FixedAsset, LedgerEntry, Milestone, Money, NewDeferredRevenueSchedule, NewFixedAsset,
    RecognitionEvent, RecognitionRequest,
};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::asset::AssetFilter;
use crate::repository::depreciation::RecordedRun;
use crate::repository::ledger::LedgerFilter;
use crate::repository::new_id;
use crate::repository::revenue::{RecognitionFilter, ScheduleDetail, ScheduleFilter};

/// Persistence operations of the finance engine.
#[async_trait]
pub trait FinanceStore: Send + Sync {
    async fn health_check(&self) -> bool;

    // ---- fixed assets -----------------------------------------------------

    /// Registers an asset and posts its acquisition line.
    async fn create_asset(&self, input: &NewFixedAsset) -> DbResult<FixedAsset>;

    /// `NotFound` when absent.
    async fn get_asset(&self, id: &str) -> DbResult<FixedAsset>;

    async fn list_assets(&self, filter: &AssetFilter) -> DbResult<Vec<FixedAsset>>;

    async fn depreciation_history(&self, asset_id: &str) -> DbResult<Vec<DepreciationEntry>>;

    /// Posts the depreciation run for `period`; `DuplicatePeriod` on repeat.
    async fn record_depreciation(&self, period: AccountingPeriod) -> DbResult<RecordedRun>;

    /// Disposes an active asset; `InvalidAssetStatus` when already disposed.
    async fn dispose_asset(&self, asset_id: &str, request: &DisposalRequest) -> DbResult<AssetDisposal>;

    async fn list_disposals(&self) -> DbResult<Vec<AssetDisposal>>;

    // ---- deferred revenue -------------------------------------------------

    async fn create_schedule(&self, input: &NewDeferredRevenueSchedule) -> DbResult<ScheduleDetail>;

    /// `NotFound` when absent.
    async fn get_schedule(&self, id: &str) -> DbResult<DeferredRevenueSchedule>;

    async fn list_schedules(&self, filter: &ScheduleFilter) -> DbResult<Vec<DeferredRevenueSchedule>>;

    async fn milestones(&self, schedule_id: &str) -> DbResult<Vec<Milestone>>;

    async fn recognitions(&self, filter: &RecognitionFilter) -> DbResult<Vec<RecognitionEvent>>;

    /// Recognized-to-date keyed by schedule id; schedules without events are absent.
    async fn recognized_totals(&self) -> DbResult<HashMap<String, Money>>;

    /// Atomic check-and-append of one recognition event.
    async fn recognize(
        &self,
        schedule_id: &str,
        request: &RecognitionRequest,
        recognition_date: DateTime<Utc>,
    ) -> DbResult<RecognitionEvent>;

    async fn cancel_schedule(&self, id: &str) -> DbResult<DeferredRevenueSchedule>;

    // ---- ledger -----------------------------------------------------------

    async fn ledger_entries(&self, filter: &LedgerFilter) -> DbResult<Vec<LedgerEntry>>;
}

#[async_trait]
impl FinanceStore for Database {
    async fn health_check(&self) -> bool {
        Database::health_check(self).await
    }

    async fn create_asset(&self, input: &NewFixedAsset) -> DbResult<FixedAsset> {
        self.assets().insert(input).await
    }

    async fn get_asset(&self, id: &str) -> DbResult<FixedAsset> {
        self.assets()
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("FixedAsset", id))
    }

    async fn list_assets(&self, filter: &AssetFilter) -> DbResult<Vec<FixedAsset>> {
        self.assets().list(filter).await
    }

    async fn depreciation_history(&self, asset_id: &str) -> DbResult<Vec<DepreciationEntry>> {
        self.depreciation().entries_for_asset(asset_id).await
    }

    async fn record_depreciation(&self, period: AccountingPeriod) -> DbResult<RecordedRun> {
        let assets = self.assets().list(&AssetFilter::active()).await?;
        let plan = plan_period_depreciation(&assets, period)?;
        debug!(period = %period, planned = plan.entries.len(), "Depreciation run planned");
        self.depreciation().record_run(&plan).await
    }

    async fn dispose_asset(&self, asset_id: &str, request: &DisposalRequest) -> DbResult<AssetDisposal> {
        let asset = FinanceStore::get_asset(self, asset_id).await?;
        let disposal_id = new_id();
        let plan = plan_disposal(&asset, request, &disposal_id)?;
        self.depreciation()
            .dispose(&asset, request, &disposal_id, &plan)
            .await
    }

    async fn list_disposals(&self) -> DbResult<Vec<AssetDisposal>> {
        self.depreciation().list_disposals().await
    }

    async fn create_schedule(&self, input: &NewDeferredRevenueSchedule) -> DbResult<ScheduleDetail> {
        self.revenue().create_schedule(input).await
    }

    async fn get_schedule(&self, id: &str) -> DbResult<DeferredRevenueSchedule> {
        self.revenue()
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("DeferredRevenueSchedule", id))
    }

    async fn list_schedules(&self, filter: &ScheduleFilter) -> DbResult<Vec<DeferredRevenueSchedule>> {
        self.revenue().list(filter).await
    }

    async fn milestones(&self, schedule_id: &str) -> DbResult<Vec<Milestone>> {
        self.revenue().milestones(schedule_id).await
    }

    async fn recognitions(&self, filter: &RecognitionFilter) -> DbResult<Vec<RecognitionEvent>> {
        self.revenue().recognitions(filter).await
    }

    async fn recognized_totals(&self) -> DbResult<HashMap<String, Money>> {
        self.revenue().recognized_totals().await
    }

    async fn recognize(
        &self,
        schedule_id: &str,
        request: &RecognitionRequest,
        recognition_date: DateTime<Utc>,
    ) -> DbResult<RecognitionEvent> {
        self.revenue()
            .recognize(schedule_id, request, recognition_date)
            .await
    }

    async fn cancel_schedule(&self, id: &str) -> DbResult<DeferredRevenueSchedule> {
        self.revenue().cancel(id).await
    }

    async fn ledger_entries(&self, filter: &LedgerFilter) -> DbResult<Vec<LedgerEntry>> {
        self.ledger().list(filter).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{memory_db, new_asset, new_schedule, utc};
    use atlvs_core::depreciation::calculate_depreciation;
    use atlvs_core::{AccountType, CoreError, DisposalMethod, ReferenceType, ScheduleStatus};
    use std::sync::Arc;

    fn store(db: Database) -> Arc<dyn FinanceStore> {
        Arc::new(db)
    }

    #[tokio::test]
    async fn test_period_recording_is_idempotent() {
        let store = store(memory_db().await);
        store.create_asset(&new_asset("Console", 1_200_000)).await.unwrap();
        let period = AccountingPeriod::new(2024, 6).unwrap();

        let first = store.record_depreciation(period).await.unwrap();
        assert_eq!(first.entries.len(), 1);

        let err = store.record_depreciation(period).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::DuplicatePeriod { .. })));

        let next = store
            .record_depreciation(AccountingPeriod::new(2024, 7).unwrap())
            .await
            .unwrap();
        assert_eq!(next.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_dispose_asset_gain_and_ledger_balance() {
        let store = store(memory_db().await);
        let asset = store.create_asset(&new_asset("Generator", 1_000_000)).await.unwrap();
        let request = DisposalRequest {
            disposal_date: utc(2026, 1, 1),
            disposal_method: DisposalMethod::Sale,
            disposal_amount: Money::from_cents(700_000),
            disposal_reason: None,
            buyer_info: Some("Rental house".to_string()),
        };

        let disposal = store.dispose_asset(&asset.id, &request).await.unwrap();
        let snapshot = calculate_depreciation(&asset, request.disposal_date).unwrap();
        assert_eq!(disposal.book_value_at_disposal, snapshot.book_value);
        assert_eq!(disposal.gain_loss, request.disposal_amount - snapshot.book_value);

        let lines = store
            .ledger_entries(&LedgerFilter {
                reference_type: Some(ReferenceType::Disposal),
                reference_id: Some(disposal.id.clone()),
            })
            .await
            .unwrap();
        let debits: Money = lines.iter().map(|l| l.debit).sum();
        let credits: Money = lines.iter().map(|l| l.credit).sum();
        assert_eq!(debits, credits);
        assert!(lines.iter().any(|l| l.account_type == AccountType::ContraAsset));

        let err = store.dispose_asset(&asset.id, &request).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidAssetStatus { .. })));

        assert_eq!(store.list_disposals().await.unwrap().len(), 1);
        assert!(matches!(
            store.dispose_asset("missing", &request).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_disposed_assets_skip_later_runs() {
        let store = store(memory_db().await);
        let asset = store.create_asset(&new_asset("Generator", 1_000_000)).await.unwrap();
        store.create_asset(&new_asset("Truss", 600_000)).await.unwrap();

        let request = DisposalRequest {
            disposal_date: utc(2024, 6, 15),
            disposal_method: DisposalMethod::Scrap,
            disposal_amount: Money::zero(),
            disposal_reason: None,
            buyer_info: None,
        };
        store.dispose_asset(&asset.id, &request).await.unwrap();

        let run = store
            .record_depreciation(AccountingPeriod::new(2024, 7).unwrap())
            .await
            .unwrap();
        assert_eq!(run.entries.len(), 1);
        assert_ne!(run.entries[0].asset_id, asset.id);
    }

    #[tokio::test]
    async fn test_schedule_round_trip_through_store() {
        let store = store(memory_db().await);
        let detail = store
            .create_schedule(&new_schedule("client-1", 1_200_000))
            .await
            .unwrap();
        let id = detail.schedule.id.clone();

        let request = RecognitionRequest {
            amount: Money::from_cents(100_000),
            recognition_date: None,
            milestone_id: None,
            notes: Some("January".to_string()),
        };
        store.recognize(&id, &request, utc(2024, 1, 31)).await.unwrap();

        let totals = store.recognized_totals().await.unwrap();
        assert_eq!(totals[&id], Money::from_cents(100_000));

        let history = store
            .recognitions(&RecognitionFilter {
                schedule_id: Some(id.clone()),
                ..RecognitionFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].notes.as_deref(), Some("January"));

        let err = store.cancel_schedule(&id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ScheduleHasRecognitions { .. })));
        assert_eq!(store.get_schedule(&id).await.unwrap().status, ScheduleStatus::Active);

        assert!(matches!(
            store.get_schedule("missing").await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
