//! # Fixed Asset Repository
//!
//! Database operations for the fixed asset register.
//!
//! ## Asset Numbers
//! ```text
//! INSERT computes the next number in the same statement:
//!
//!   MAX(FA-000041, FA-000042) + 1  ──►  FA-000043
//!
//! so two concurrent creates never read the same maximum; the loser of a
//! write-lock race simply computes the number after the winner's.
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use atlvs_core::validation::validate_new_asset;
use atlvs_core::{
    ledger, AssetCategory, AssetStatus, DepreciationMethod, FixedAsset, Money, NewFixedAsset,
    ASSET_NUMBER_PREFIX,
};

use crate::error::{DbError, DbResult};
use crate::repository::{new_id, parse_decimal, parse_decimal_opt};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, FromRow)]
pub(crate) struct AssetRow {
    id: String,
    asset_number: String,
    name: String,
    category: AssetCategory,
    description: Option<String>,
    acquisition_date: DateTime<Utc>,
    acquisition_cost_cents: i64,
    salvage_value_cents: i64,
    useful_life_years: String,
    depreciation_method: DepreciationMethod,
    depreciation_rate: Option<String>,
    location: Option<String>,
    serial_number: Option<String>,
    notes: Option<String>,
    status: AssetStatus,
    disposal_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AssetRow> for FixedAsset {
    type Error = DbError;

    fn try_from(row: AssetRow) -> DbResult<Self> {
        Ok(FixedAsset {
            useful_life_years: parse_decimal("fixed_assets.useful_life_years", &row.useful_life_years)?,
            depreciation_rate: parse_decimal_opt(
                "fixed_assets.depreciation_rate",
                row.depreciation_rate.as_deref(),
            )?,
            id: row.id,
            asset_number: row.asset_number,
            name: row.name,
            category: row.category,
            description: row.description,
            acquisition_date: row.acquisition_date,
            acquisition_cost: Money::from_cents(row.acquisition_cost_cents),
            salvage_value: Money::from_cents(row.salvage_value_cents),
            depreciation_method: row.depreciation_method,
            location: row.location,
            serial_number: row.serial_number,
            notes: row.notes,
            status: row.status,
            disposal_date: row.disposal_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ASSET_COLUMNS: &str = r#"
    id, asset_number, name, category, description,
    acquisition_date, acquisition_cost_cents, salvage_value_cents,
    useful_life_years, depreciation_method, depreciation_rate,
    location, serial_number, notes, status, disposal_date,
    created_at, updated_at
"#;

/// Loads one asset with any executor (pool or open transaction).
pub(crate) async fn fetch_asset<'e, E>(executor: E, id: &str) -> DbResult<Option<FixedAsset>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {} FROM fixed_assets WHERE id = ?1", ASSET_COLUMNS);
    let row: Option<AssetRow> = sqlx::query_as(&sql).bind(id).fetch_optional(executor).await?;
    row.map(FixedAsset::try_from).transpose()
}

// =============================================================================
// Repository
// =============================================================================

/// Optional narrowing for asset listings.
#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    pub category: Option<AssetCategory>,
    pub status: Option<AssetStatus>,
}

impl AssetFilter {
    pub fn active() -> Self {
        AssetFilter {
            category: None,
            status: Some(AssetStatus::Active),
        }
    }
}

/// Repository for fixed asset database operations.
#[derive(Debug, Clone)]
pub struct AssetRepository {
    pool: SqlitePool,
}

impl AssetRepository {
    /// Creates a new AssetRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AssetRepository { pool }
    }

    /// Gets an asset by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<FixedAsset>> {
        fetch_asset(&self.pool, id).await
    }

    /// Gets an asset by its register number (`FA-000001`).
    pub async fn get_by_number(&self, asset_number: &str) -> DbResult<Option<FixedAsset>> {
        let sql = format!("SELECT {} FROM fixed_assets WHERE asset_number = ?1", ASSET_COLUMNS);
        let row: Option<AssetRow> = sqlx::query_as(&sql)
            .bind(asset_number)
            .fetch_optional(&self.pool)
            .await?;
        row.map(FixedAsset::try_from).transpose()
    }

    /// Lists assets in register order.
    pub async fn list(&self, filter: &AssetFilter) -> DbResult<Vec<FixedAsset>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM fixed_assets
            WHERE (?1 IS NULL OR category = ?1)
              AND (?2 IS NULL OR status = ?2)
            ORDER BY asset_number
            "#,
            ASSET_COLUMNS
        );
        let rows: Vec<AssetRow> = sqlx::query_as(&sql)
            .bind(filter.category)
            .bind(filter.status)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(FixedAsset::try_from).collect()
    }

    /// Counts assets, optionally by status.
    pub async fn count(&self, status: Option<AssetStatus>) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM fixed_assets WHERE (?1 IS NULL OR status = ?1)")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Registers a new asset and posts its acquisition ledger line.
    ///
    /// ## What This Does
    /// 1. Validates the input (cost, salvage, life, rate, text lengths)
    /// 2. Inserts the asset with the next `FA-NNNNNN` number
    /// 3. Appends the asset debit for the acquisition cost
    ///
    /// Steps 2 and 3 share one transaction.
    pub async fn insert(&self, input: &NewFixedAsset) -> DbResult<FixedAsset> {
        validate_new_asset(input).map_err(atlvs_core::CoreError::from)?;

        let id = new_id();
        let now = Utc::now();

        debug!(id = %id, name = %input.name, "Creating fixed asset");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO fixed_assets (
                id, asset_number, name, category, description,
                acquisition_date, acquisition_cost_cents, salvage_value_cents,
                useful_life_years, depreciation_method, depreciation_rate,
                location, serial_number, notes, status, disposal_date,
                created_at, updated_at
            ) VALUES (
                ?1,
                printf('%s-%06d', ?2, COALESCE((
                    SELECT MAX(CAST(substr(asset_number, length(?2) + 2) AS INTEGER))
                    FROM fixed_assets
                    WHERE asset_number LIKE ?2 || '-%'
                ), 0) + 1),
                ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13, ?14, 'active', NULL,
                ?15, ?15
            )
            "#,
        )
        .bind(&id)
        .bind(ASSET_NUMBER_PREFIX)
        .bind(input.name.trim())
        .bind(input.category)
        .bind(&input.description)
        .bind(input.acquisition_date)
        .bind(input.acquisition_cost.cents())
        .bind(input.salvage_value.cents())
        .bind(input.useful_life_years.to_string())
        .bind(input.depreciation_method)
        .bind(input.depreciation_rate.map(|r| r.to_string()))
        .bind(&input.location)
        .bind(&input.serial_number)
        .bind(&input.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let asset = fetch_asset(&mut *tx, &id)
            .await?
            .ok_or_else(|| DbError::not_found("FixedAsset", &id))?;

        crate::repository::ledger::append(&mut *tx, &ledger::acquisition_entry(&asset)).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            id = %asset.id,
            asset_number = %asset.asset_number,
            cost = %asset.acquisition_cost,
            "Fixed asset created"
        );

        Ok(asset)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
