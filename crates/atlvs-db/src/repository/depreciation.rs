//! # Depreciation Repository
//!
//! Period runs, per-asset depreciation entries and asset disposals.
//!
//! ## Period Run
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_run(plan)                        one transaction               │
//! │                                                                         │
//! │  1. INSERT depreciation_runs(period_start)  ── UNIQUE? ──► DuplicatePeriod
//! │  2. INSERT depreciation_entries (one per planned asset)                │
//! │  3. INSERT ledger_entries (expense debit, run total)                   │
//! │  4. COMMIT                                                             │
//! │                                                                         │
//! │  Step 1 comes first so a second run for the same period writes         │
//! │  nothing at all.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Disposal
//! The status flip `active → disposed` is a conditional UPDATE; losing a
//! race against another disposal leaves zero affected rows and the whole
//! transaction is abandoned.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info, warn};

use atlvs_core::depreciation::{DisposalPlan, PeriodDepreciationPlan};
use atlvs_core::{
    ledger, AccountingPeriod, AssetDisposal, CoreError, DepreciationEntry, DisposalMethod,
    DisposalRequest, FixedAsset, Money,
};

use crate::error::{DbError, DbResult};
use crate::repository::asset::fetch_asset;
use crate::repository::ledger::append;
use crate::repository::new_id;

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, FromRow)]
struct EntryRow {
    id: String,
    asset_id: String,
    period_start: NaiveDate,
    period_end: NaiveDate,
    depreciation_amount_cents: i64,
    accumulated_depreciation_cents: i64,
    book_value_cents: i64,
    created_at: DateTime<Utc>,
}

impl From<EntryRow> for DepreciationEntry {
    fn from(row: EntryRow) -> Self {
        DepreciationEntry {
            id: row.id,
            asset_id: row.asset_id,
            period_start: row.period_start,
            period_end: row.period_end,
            depreciation_amount: Money::from_cents(row.depreciation_amount_cents),
            accumulated_depreciation: Money::from_cents(row.accumulated_depreciation_cents),
            book_value: Money::from_cents(row.book_value_cents),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct DisposalRow {
    id: String,
    asset_id: String,
    disposal_date: DateTime<Utc>,
    disposal_method: DisposalMethod,
    disposal_amount_cents: i64,
    disposal_reason: Option<String>,
    buyer_info: Option<String>,
    book_value_at_disposal_cents: i64,
    accumulated_depreciation_cents: i64,
    gain_loss_cents: i64,
    created_at: DateTime<Utc>,
}

impl From<DisposalRow> for AssetDisposal {
    fn from(row: DisposalRow) -> Self {
        AssetDisposal {
            id: row.id,
            asset_id: row.asset_id,
            disposal_date: row.disposal_date,
            disposal_method: row.disposal_method,
            disposal_amount: Money::from_cents(row.disposal_amount_cents),
            disposal_reason: row.disposal_reason,
            buyer_info: row.buyer_info,
            book_value_at_disposal: Money::from_cents(row.book_value_at_disposal_cents),
            accumulated_depreciation: Money::from_cents(row.accumulated_depreciation_cents),
            gain_loss: Money::from_cents(row.gain_loss_cents),
            created_at: row.created_at,
        }
    }
}

const DISPOSAL_COLUMNS: &str = r#"
    id, asset_id, disposal_date, disposal_method, disposal_amount_cents,
    disposal_reason, buyer_info, book_value_at_disposal_cents,
    accumulated_depreciation_cents, gain_loss_cents, created_at
"#;

/// A posted period run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedRun {
    pub period: AccountingPeriod,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub entries: Vec<DepreciationEntry>,
    pub total_depreciation: Money,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for depreciation runs, entries and disposals.
#[derive(Debug, Clone)]
pub struct DepreciationRepository {
    pool: SqlitePool,
}

impl DepreciationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DepreciationRepository { pool }
    }

    /// True when a run has been posted for `period`.
    pub async fn has_run(&self, period: AccountingPeriod) -> DbResult<bool> {
        let found: Option<String> =
            sqlx::query_scalar("SELECT period_start FROM depreciation_runs WHERE period_start = ?1")
                .bind(period.start_date())
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    /// Posts a planned period run.
    ///
    /// ## Errors
    /// - `Domain(DuplicatePeriod)` when the period already has a run
    pub async fn record_run(&self, plan: &PeriodDepreciationPlan) -> DbResult<RecordedRun> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            r#"
            INSERT INTO depreciation_runs (
                period_start, period_end, total_depreciation_cents, asset_count, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(plan.period_start)
        .bind(plan.period_end)
        .bind(plan.total_depreciation.cents())
        .bind(plan.entries.len() as i64)
        .bind(now)
        .execute(&mut *tx)
        .await;

        if let Err(e) = claimed {
            let err = DbError::from(e);
            if err.is_unique_violation_on("depreciation_runs.period_start") {
                warn!(period = %plan.period, "Depreciation already recorded for period");
                return Err(CoreError::DuplicatePeriod {
                    period: plan.period.to_string(),
                }
                .into());
            }
            return Err(err);
        }

        let mut entries = Vec::with_capacity(plan.entries.len());
        for planned in &plan.entries {
            let entry = DepreciationEntry {
                id: new_id(),
                asset_id: planned.asset_id.clone(),
                period_start: plan.period_start,
                period_end: plan.period_end,
                depreciation_amount: planned.depreciation_amount,
                accumulated_depreciation: planned.accumulated_after,
                book_value: planned.book_value_after,
                created_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO depreciation_entries (
                    id, asset_id, period_start, period_end,
                    depreciation_amount_cents, accumulated_depreciation_cents,
                    book_value_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&entry.id)
            .bind(&entry.asset_id)
            .bind(entry.period_start)
            .bind(entry.period_end)
            .bind(entry.depreciation_amount.cents())
            .bind(entry.accumulated_depreciation.cents())
            .bind(entry.book_value.cents())
            .bind(entry.created_at)
            .execute(&mut *tx)
            .await?;

            entries.push(entry);
        }

        if let Some(line) = ledger::period_depreciation_entry(plan) {
            append(&mut *tx, &line).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            period = %plan.period,
            assets = entries.len(),
            total = %plan.total_depreciation,
            "Depreciation run recorded"
        );

        Ok(RecordedRun {
            period: plan.period,
            period_start: plan.period_start,
            period_end: plan.period_end,
            entries,
            total_depreciation: plan.total_depreciation,
            created_at: now,
        })
    }

    /// Posted entries for one asset, oldest period first.
    pub async fn entries_for_asset(&self, asset_id: &str) -> DbResult<Vec<DepreciationEntry>> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            r#"
            SELECT id, asset_id, period_start, period_end,
                   depreciation_amount_cents, accumulated_depreciation_cents,
                   book_value_cents, created_at
            FROM depreciation_entries
            WHERE asset_id = ?1
            ORDER BY period_start
            "#,
        )
        .bind(asset_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DepreciationEntry::from).collect())
    }

    /// Persists a planned disposal.
    ///
    /// ## What This Does
    /// 1. Flips the asset to `disposed` (only if still `active`)
    /// 2. Inserts the disposal record
    /// 3. Appends the disposal ledger lines from the plan
    ///
    /// ## Errors
    /// - `NotFound` when the asset vanished
    /// - `Domain(InvalidAssetStatus)` when it was disposed in the meantime
    pub async fn dispose(
        &self,
        asset: &FixedAsset,
        request: &DisposalRequest,
        disposal_id: &str,
        plan: &DisposalPlan,
    ) -> DbResult<AssetDisposal> {
        let now = Utc::now();
        debug!(asset_id = %asset.id, disposal_id = %disposal_id, "Disposing asset");

        let mut tx = self.pool.begin().await?;

        let flipped = sqlx::query(
            r#"
            UPDATE fixed_assets SET
                status = 'disposed',
                disposal_date = ?2,
                updated_at = ?3
            WHERE id = ?1 AND status = 'active'
            "#,
        )
        .bind(&asset.id)
        .bind(request.disposal_date)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            return match fetch_asset(&mut *tx, &asset.id).await? {
                None => Err(DbError::not_found("FixedAsset", &asset.id)),
                Some(current) => Err(CoreError::InvalidAssetStatus {
                    asset_id: current.id,
                    status: current.status.as_str().to_string(),
                }
                .into()),
            };
        }

        let disposal = AssetDisposal {
            id: disposal_id.to_string(),
            asset_id: asset.id.clone(),
            disposal_date: request.disposal_date,
            disposal_method: request.disposal_method,
            disposal_amount: request.disposal_amount,
            disposal_reason: request.disposal_reason.clone(),
            buyer_info: request.buyer_info.clone(),
            book_value_at_disposal: plan.book_value_at_disposal,
            accumulated_depreciation: plan.accumulated_depreciation,
            gain_loss: plan.gain_loss,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO asset_disposals (
                id, asset_id, disposal_date, disposal_method, disposal_amount_cents,
                disposal_reason, buyer_info, book_value_at_disposal_cents,
                accumulated_depreciation_cents, gain_loss_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&disposal.id)
        .bind(&disposal.asset_id)
        .bind(disposal.disposal_date)
        .bind(disposal.disposal_method)
        .bind(disposal.disposal_amount.cents())
        .bind(&disposal.disposal_reason)
        .bind(&disposal.buyer_info)
        .bind(disposal.book_value_at_disposal.cents())
        .bind(disposal.accumulated_depreciation.cents())
        .bind(disposal.gain_loss.cents())
        .bind(disposal.created_at)
        .execute(&mut *tx)
        .await?;

        for line in &plan.ledger_lines {
            append(&mut *tx, line).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            asset_id = %disposal.asset_id,
            proceeds = %disposal.disposal_amount,
            gain_loss = %disposal.gain_loss,
            "Asset disposed"
        );

        Ok(disposal)
    }

    /// All disposals, most recent first.
    pub async fn list_disposals(&self) -> DbResult<Vec<AssetDisposal>> {
        let sql = format!(
            "SELECT {} FROM asset_disposals ORDER BY disposal_date DESC, created_at DESC",
            DISPOSAL_COLUMNS
        );
        let rows: Vec<DisposalRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(AssetDisposal::from).collect())
    }

    /// The disposal of one asset, if any.
    pub async fn disposal_for_asset(&self, asset_id: &str) -> DbResult<Option<AssetDisposal>> {
        let sql = format!("SELECT {} FROM asset_disposals WHERE asset_id = ?1", DISPOSAL_COLUMNS);
        let row: Option<DisposalRow> = sqlx::query_as(&sql)
            .bind(asset_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(AssetDisposal::from))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
