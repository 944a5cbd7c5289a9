//! # Ledger Repository
//!
//! Append-only general ledger. Lines are written by the other repositories
//! inside their own transactions through [`append`]; this repository only
//! reads them back.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteExecutor, SqlitePool};
use tracing::debug;

use atlvs_core::ledger::NewLedgerEntry;
use atlvs_core::{AccountType, LedgerEntry, Money, ReferenceType};

use crate::error::DbResult;
use crate::repository::new_id;

#[derive(Debug, FromRow)]
struct LedgerRow {
    id: String,
    entry_date: DateTime<Utc>,
    description: String,
    debit_cents: i64,
    credit_cents: i64,
    account_type: AccountType,
    reference_type: ReferenceType,
    reference_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<LedgerRow> for LedgerEntry {
    fn from(row: LedgerRow) -> Self {
        LedgerEntry {
            id: row.id,
            entry_date: row.entry_date,
            description: row.description,
            debit: Money::from_cents(row.debit_cents),
            credit: Money::from_cents(row.credit_cents),
            account_type: row.account_type,
            reference_type: row.reference_type,
            reference_id: row.reference_id,
            created_at: row.created_at,
        }
    }
}

/// Optional narrowing for ledger reads.
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<String>,
}

/// Appends one line. Call with the caller's transaction.
pub(crate) async fn append<'e, E>(executor: E, entry: &NewLedgerEntry) -> DbResult<String>
where
    E: SqliteExecutor<'e>,
{
    let id = new_id();
    debug!(
        id = %id,
        account_type = ?entry.account_type,
        debit = %entry.debit,
        credit = %entry.credit,
        "Appending ledger entry"
    );

    sqlx::query(
        r#"
        INSERT INTO ledger_entries (
            id, entry_date, description, debit_cents, credit_cents,
            account_type, reference_type, reference_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&id)
    .bind(entry.entry_date)
    .bind(&entry.description)
    .bind(entry.debit.cents())
    .bind(entry.credit.cents())
    .bind(entry.account_type)
    .bind(entry.reference_type)
    .bind(&entry.reference_id)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    Ok(id)
}

/// Repository for ledger reads.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Ledger lines in posting order.
    pub async fn list(&self, filter: &LedgerFilter) -> DbResult<Vec<LedgerEntry>> {
        let rows: Vec<LedgerRow> = sqlx::query_as(
            r#"
            SELECT id, entry_date, description, debit_cents, credit_cents,
                   account_type, reference_type, reference_id, created_at
            FROM ledger_entries
            WHERE (?1 IS NULL OR reference_type = ?1)
              AND (?2 IS NULL OR reference_id = ?2)
            ORDER BY entry_date, created_at, rowid
            "#,
        )
        .bind(filter.reference_type)
        .bind(&filter.reference_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LedgerEntry::from).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_ledger_is_append_only() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let date = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let entry = atlvs_core::ledger::recognition_entry("rec-1", Money::from_cents(500), date, None);

        let id = append(db.pool(), &entry).await.unwrap();

        let lines = db.ledger().list(&LedgerFilter::default()).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].id, id);
        assert_eq!(lines[0].debit, Money::from_cents(500));
        assert_eq!(lines[0].account_type, AccountType::Revenue);

        let update = sqlx::query("UPDATE ledger_entries SET debit_cents = 0")
            .execute(db.pool())
            .await;
        assert!(update.is_err());

        let delete = sqlx::query("DELETE FROM ledger_entries").execute(db.pool()).await;
        assert!(delete.is_err());
    }

    #[tokio::test]
    async fn test_filter_by_reference() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let date = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        for id in ["rec-1", "rec-2"] {
            let entry = atlvs_core::ledger::recognition_entry(id, Money::from_cents(100), date, None);
            append(db.pool(), &entry).await.unwrap();
        }

        let filter = LedgerFilter {
            reference_type: Some(ReferenceType::RevenueRecognition),
            reference_id: Some("rec-2".to_string()),
        };
        let lines = db.ledger().list(&filter).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].reference_id.as_deref(), Some("rec-2"));

        let filter = LedgerFilter {
            reference_type: Some(ReferenceType::Depreciation),
            reference_id: None,
        };
        assert!(db.ledger().list(&filter).await.unwrap().is_empty());
    }
}
