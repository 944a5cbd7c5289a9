//! # Deferred Revenue Repository
//!
//! Schedules, their milestones and the recognition events posted against
//! them.
//!
//! ## Atomic Recognition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  recognize(schedule_id, request, date)          one transaction        │
//! │                                                                         │
//! │  1. UPDATE deferred_revenue SET updated_at     ← takes the write lock  │
//! │       0 rows → NotFound                          before anything is    │
//! │                                                  read                  │
//! │  2. UPDATE milestone → completed (if given)                            │
//! │       0 rows → NotFound                                                │
//! │  3. INSERT revenue_recognitions                                        │
//! │       SELECT ... WHERE status <> 'cancelled'                           │
//! │         AND SUM(recognized) + amount <= total                          │
//! │       0 rows → re-read, classify, ROLLBACK                             │
//! │  4. UPDATE status = 'fully_recognized' when the sum reaches total      │
//! │  5. INSERT ledger line (revenue debit)                                 │
//! │  6. COMMIT                                                             │
//! │                                                                         │
//! │  Two concurrent requests whose sum would exceed the total: one         │
//! │  commits, the other sees the first's row in step 3 and is rejected.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqliteExecutor, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use atlvs_core::recognition::{can_cancel, check_recognition, plan_milestones};
use atlvs_core::validation::{validate_new_schedule, validate_positive_amount, validate_text};
use atlvs_core::{
    ledger, CoreError, DeferredRevenueSchedule, Milestone, MilestoneStatus, Money,
    NewDeferredRevenueSchedule, RecognitionEvent, RecognitionMethod, RecognitionRequest,
    ScheduleStatus, DEFAULT_CURRENCY,
};

use crate::error::{DbError, DbResult};
use crate::repository::ledger::append;
use crate::repository::{new_id, parse_decimal};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, FromRow)]
struct ScheduleRow {
    id: String,
    client_id: String,
    project_id: Option<String>,
    contract_id: Option<String>,
    invoice_id: Option<String>,
    total_amount_cents: i64,
    currency: String,
    recognition_method: RecognitionMethod,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    description: Option<String>,
    status: ScheduleStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ScheduleRow> for DeferredRevenueSchedule {
    fn from(row: ScheduleRow) -> Self {
        DeferredRevenueSchedule {
            id: row.id,
            client_id: row.client_id,
            project_id: row.project_id,
            contract_id: row.contract_id,
            invoice_id: row.invoice_id,
            total_amount: Money::from_cents(row.total_amount_cents),
            currency: row.currency,
            recognition_method: row.recognition_method,
            start_date: row.start_date,
            end_date: row.end_date,
            description: row.description,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MilestoneRow {
    id: String,
    schedule_id: String,
    name: String,
    percentage: String,
    amount_cents: i64,
    target_date: Option<DateTime<Utc>>,
    sequence: i64,
    status: MilestoneStatus,
    completed_date: Option<DateTime<Utc>>,
}

impl TryFrom<MilestoneRow> for Milestone {
    type Error = DbError;

    fn try_from(row: MilestoneRow) -> DbResult<Self> {
        Ok(Milestone {
            percentage: parse_decimal("deferred_revenue_milestones.percentage", &row.percentage)?,
            id: row.id,
            schedule_id: row.schedule_id,
            name: row.name,
            amount: Money::from_cents(row.amount_cents),
            target_date: row.target_date,
            sequence: row.sequence,
            status: row.status,
            completed_date: row.completed_date,
        })
    }
}

#[derive(Debug, FromRow)]
struct RecognitionRow {
    id: String,
    schedule_id: String,
    amount_cents: i64,
    recognition_date: DateTime<Utc>,
    milestone_id: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RecognitionRow> for RecognitionEvent {
    fn from(row: RecognitionRow) -> Self {
        RecognitionEvent {
            id: row.id,
            schedule_id: row.schedule_id,
            amount: Money::from_cents(row.amount_cents),
            recognition_date: row.recognition_date,
            milestone_id: row.milestone_id,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

const SCHEDULE_COLUMNS: &str = r#"
    id, client_id, project_id, contract_id, invoice_id,
    total_amount_cents, currency, recognition_method,
    start_date, end_date, description, status, created_at, updated_at
"#;

async fn fetch_schedule<'e, E>(executor: E, id: &str) -> DbResult<Option<DeferredRevenueSchedule>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {} FROM deferred_revenue WHERE id = ?1", SCHEDULE_COLUMNS);
    let row: Option<ScheduleRow> = sqlx::query_as(&sql).bind(id).fetch_optional(executor).await?;
    Ok(row.map(DeferredRevenueSchedule::from))
}

async fn fetch_recognized<'e, E>(executor: E, schedule_id: &str) -> DbResult<Money>
where
    E: SqliteExecutor<'e>,
{
    let cents: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM revenue_recognitions WHERE schedule_id = ?1",
    )
    .bind(schedule_id)
    .fetch_one(executor)
    .await?;
    Ok(Money::from_cents(cents))
}

/// Explains why the conditional recognition insert matched nothing.
async fn classify_rejection(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    schedule_id: &str,
    amount: Money,
) -> DbError {
    let schedule = match fetch_schedule(&mut **tx, schedule_id).await {
        Ok(Some(schedule)) => schedule,
        Ok(None) => return DbError::not_found("DeferredRevenueSchedule", schedule_id),
        Err(e) => return e,
    };
    let recognized = match fetch_recognized(&mut **tx, schedule_id).await {
        Ok(recognized) => recognized,
        Err(e) => return e,
    };

    match check_recognition(&schedule, recognized, amount) {
        Err(e) => e.into(),
        Ok(_) => DbError::TransactionFailed(format!(
            "recognition on schedule {} rejected without a matching rule",
            schedule_id
        )),
    }
}

// =============================================================================
// Filters & Results
// =============================================================================

/// Optional narrowing for schedule listings.
#[derive(Debug, Clone, Default)]
pub struct ScheduleFilter {
    pub client_id: Option<String>,
    pub project_id: Option<String>,
    pub status: Option<ScheduleStatus>,
}

/// Optional narrowing for recognition history. Bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct RecognitionFilter {
    pub schedule_id: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// A schedule with its milestones in sequence order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleDetail {
    #[serde(flatten)]
    pub schedule: DeferredRevenueSchedule,
    pub milestones: Vec<Milestone>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for deferred revenue schedules and recognitions.
#[derive(Debug, Clone)]
pub struct RevenueRepository {
    pool: SqlitePool,
}

impl RevenueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RevenueRepository { pool }
    }

    /// Creates a schedule and its milestones.
    ///
    /// Milestone amounts are `total × percentage / 100`, sequence numbers
    /// follow input order starting at 1.
    pub async fn create_schedule(&self, input: &NewDeferredRevenueSchedule) -> DbResult<ScheduleDetail> {
        validate_new_schedule(input).map_err(CoreError::from)?;

        let id = new_id();
        let now = Utc::now();
        let currency = input.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);

        debug!(id = %id, client_id = %input.client_id, total = %input.total_amount, "Creating schedule");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO deferred_revenue (
                id, client_id, project_id, contract_id, invoice_id,
                total_amount_cents, currency, recognition_method,
                start_date, end_date, description, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'active', ?12, ?12)
            "#,
        )
        .bind(&id)
        .bind(input.client_id.trim())
        .bind(&input.project_id)
        .bind(&input.contract_id)
        .bind(&input.invoice_id)
        .bind(input.total_amount.cents())
        .bind(currency)
        .bind(input.recognition_method)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(&input.description)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let mut milestones = Vec::with_capacity(input.milestones.len());
        for planned in plan_milestones(input.total_amount, &input.milestones) {
            let milestone = Milestone {
                id: new_id(),
                schedule_id: id.clone(),
                name: planned.name,
                percentage: planned.percentage,
                amount: planned.amount,
                target_date: planned.target_date,
                sequence: planned.sequence,
                status: MilestoneStatus::Pending,
                completed_date: None,
            };

            sqlx::query(
                r#"
                INSERT INTO deferred_revenue_milestones (
                    id, schedule_id, name, percentage, amount_cents,
                    target_date, sequence, status, completed_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'pending', NULL)
                "#,
            )
            .bind(&milestone.id)
            .bind(&milestone.schedule_id)
            .bind(&milestone.name)
            .bind(milestone.percentage.to_string())
            .bind(milestone.amount.cents())
            .bind(milestone.target_date)
            .bind(milestone.sequence)
            .execute(&mut *tx)
            .await?;

            milestones.push(milestone);
        }

        let schedule = fetch_schedule(&mut *tx, &id)
            .await?
            .ok_or_else(|| DbError::not_found("DeferredRevenueSchedule", &id))?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            id = %schedule.id,
            client_id = %schedule.client_id,
            milestones = milestones.len(),
            "Deferred revenue schedule created"
        );

        Ok(ScheduleDetail { schedule, milestones })
    }

    /// Gets a schedule by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<DeferredRevenueSchedule>> {
        fetch_schedule(&self.pool, id).await
    }

    /// Lists schedules, newest start date first.
    pub async fn list(&self, filter: &ScheduleFilter) -> DbResult<Vec<DeferredRevenueSchedule>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM deferred_revenue
            WHERE (?1 IS NULL OR client_id = ?1)
              AND (?2 IS NULL OR project_id = ?2)
              AND (?3 IS NULL OR status = ?3)
            ORDER BY start_date DESC, created_at DESC
            "#,
            SCHEDULE_COLUMNS
        );
        let rows: Vec<ScheduleRow> = sqlx::query_as(&sql)
            .bind(&filter.client_id)
            .bind(&filter.project_id)
            .bind(filter.status)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(DeferredRevenueSchedule::from).collect())
    }

    /// Milestones of one schedule in sequence order.
    pub async fn milestones(&self, schedule_id: &str) -> DbResult<Vec<Milestone>> {
        let rows: Vec<MilestoneRow> = sqlx::query_as(
            r#"
            SELECT id, schedule_id, name, percentage, amount_cents,
                   target_date, sequence, status, completed_date
            FROM deferred_revenue_milestones
            WHERE schedule_id = ?1
            ORDER BY sequence
            "#,
        )
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Milestone::try_from).collect()
    }

    /// Recognition events, oldest first.
    pub async fn recognitions(&self, filter: &RecognitionFilter) -> DbResult<Vec<RecognitionEvent>> {
        let rows: Vec<RecognitionRow> = sqlx::query_as(
            r#"
            SELECT id, schedule_id, amount_cents, recognition_date,
                   milestone_id, notes, created_at
            FROM revenue_recognitions
            WHERE (?1 IS NULL OR schedule_id = ?1)
            ORDER BY recognition_date, created_at, rowid
            "#,
        )
        .bind(&filter.schedule_id)
        .fetch_all(&self.pool)
        .await?;

        // bounds compare parsed instants, not stored text
        Ok(rows
            .into_iter()
            .map(RecognitionEvent::from)
            .filter(|e| filter.start.map_or(true, |s| e.recognition_date >= s))
            .filter(|e| filter.end.map_or(true, |end| e.recognition_date <= end))
            .collect())
    }

    /// Recognized-to-date for one schedule.
    pub async fn recognized_to_date(&self, schedule_id: &str) -> DbResult<Money> {
        fetch_recognized(&self.pool, schedule_id).await
    }

    /// Recognized-to-date for every schedule that has events.
    pub async fn recognized_totals(&self) -> DbResult<HashMap<String, Money>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT schedule_id, SUM(amount_cents) FROM revenue_recognitions GROUP BY schedule_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, cents)| (id, Money::from_cents(cents)))
            .collect())
    }

    /// Appends a recognition event, never letting the schedule's
    /// recognized total exceed its total amount.
    ///
    /// ## Errors
    /// - `Domain(Validation)` for a non-positive amount or oversized notes
    /// - `NotFound` for an unknown schedule or milestone
    /// - `Domain(InvalidScheduleStatus)` for a cancelled schedule
    /// - `Domain(ExceedsRemainingBalance)` when the amount does not fit
    pub async fn recognize(
        &self,
        schedule_id: &str,
        request: &RecognitionRequest,
        recognition_date: DateTime<Utc>,
    ) -> DbResult<RecognitionEvent> {
        validate_positive_amount("amount", request.amount).map_err(CoreError::from)?;
        validate_text("notes", request.notes.as_deref()).map_err(CoreError::from)?;

        let now = Utc::now();
        let event = RecognitionEvent {
            id: new_id(),
            schedule_id: schedule_id.to_string(),
            amount: request.amount,
            recognition_date,
            milestone_id: request.milestone_id.clone(),
            notes: request.notes.clone(),
            created_at: now,
        };

        debug!(schedule_id = %schedule_id, amount = %event.amount, "Recognizing revenue");

        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE deferred_revenue SET updated_at = ?2 WHERE id = ?1")
            .bind(schedule_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(DbError::not_found("DeferredRevenueSchedule", schedule_id));
        }

        if let Some(milestone_id) = &event.milestone_id {
            let completed = sqlx::query(
                r#"
                UPDATE deferred_revenue_milestones SET
                    status = 'completed',
                    completed_date = ?3
                WHERE id = ?1 AND schedule_id = ?2
                "#,
            )
            .bind(milestone_id)
            .bind(schedule_id)
            .bind(recognition_date)
            .execute(&mut *tx)
            .await?;
            if completed.rows_affected() == 0 {
                return Err(DbError::not_found("Milestone", milestone_id));
            }
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO revenue_recognitions (
                id, schedule_id, amount_cents, recognition_date, milestone_id, notes, created_at
            )
            SELECT ?1, d.id, ?3, ?4, ?5, ?6, ?7
            FROM deferred_revenue d
            WHERE d.id = ?2
              AND d.status <> 'cancelled'
              AND (
                  SELECT COALESCE(SUM(r.amount_cents), 0)
                  FROM revenue_recognitions r
                  WHERE r.schedule_id = d.id
              ) + ?3 <= d.total_amount_cents
            "#,
        )
        .bind(&event.id)
        .bind(schedule_id)
        .bind(event.amount.cents())
        .bind(event.recognition_date)
        .bind(&event.milestone_id)
        .bind(&event.notes)
        .bind(event.created_at)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            let rejection = classify_rejection(&mut tx, schedule_id, event.amount).await;
            warn!(schedule_id = %schedule_id, amount = %event.amount, error = %rejection, "Recognition rejected");
            return Err(rejection);
        }

        sqlx::query(
            r#"
            UPDATE deferred_revenue SET status = 'fully_recognized'
            WHERE id = ?1
              AND status = 'active'
              AND (
                  SELECT COALESCE(SUM(amount_cents), 0)
                  FROM revenue_recognitions
                  WHERE schedule_id = ?1
              ) >= total_amount_cents
            "#,
        )
        .bind(schedule_id)
        .execute(&mut *tx)
        .await?;

        let line = ledger::recognition_entry(
            &event.id,
            event.amount,
            event.recognition_date,
            event.notes.as_deref(),
        );
        append(&mut *tx, &line).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            id = %event.id,
            schedule_id = %schedule_id,
            amount = %event.amount,
            "Revenue recognized"
        );

        Ok(event)
    }

    /// Cancels a schedule that has no recognitions yet.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown schedule
    /// - `Domain(ScheduleHasRecognitions)` once revenue has been recognized
    /// - `Domain(InvalidScheduleStatus)` when it is not active
    pub async fn cancel(&self, schedule_id: &str) -> DbResult<DeferredRevenueSchedule> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let cancelled = sqlx::query(
            r#"
            UPDATE deferred_revenue SET
                status = 'cancelled',
                updated_at = ?2
            WHERE id = ?1
              AND status = 'active'
              AND NOT EXISTS (SELECT 1 FROM revenue_recognitions WHERE schedule_id = ?1)
            "#,
        )
        .bind(schedule_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let schedule = fetch_schedule(&mut *tx, schedule_id)
            .await?
            .ok_or_else(|| DbError::not_found("DeferredRevenueSchedule", schedule_id))?;

        if cancelled.rows_affected() == 0 {
            let count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM revenue_recognitions WHERE schedule_id = ?1")
                    .bind(schedule_id)
                    .fetch_one(&mut *tx)
                    .await?;
            can_cancel(&schedule, count as usize)?;
            return Err(DbError::TransactionFailed(format!(
                "cancel of schedule {} rejected without a matching rule",
                schedule_id
            )));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %schedule_id, "Deferred revenue schedule cancelled");
        Ok(schedule)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::ledger::LedgerFilter;
    use crate::test_support::{memory_db, new_schedule, utc};
    use crate::{Database, DbConfig};
    use atlvs_core::{AccountType, NewMilestone, ReferenceType};
    use rust_decimal_macros::dec;

    fn request(cents: i64) -> RecognitionRequest {
        RecognitionRequest {
            amount: Money::from_cents(cents),
            recognition_date: None,
            milestone_id: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_schedule_with_milestones() {
        let db = memory_db().await;
        let mut input = new_schedule("client-1", 1_000_000);
        input.recognition_method = RecognitionMethod::Milestone;
        input.milestones = vec![
            NewMilestone {
                name: "Design".to_string(),
                percentage: dec!(30),
                target_date: None,
            },
            NewMilestone {
                name: "Build".to_string(),
                percentage: dec!(70),
                target_date: Some(utc(2024, 9, 1)),
            },
        ];

        let detail = db.revenue().create_schedule(&input).await.unwrap();
        assert_eq!(detail.schedule.currency, "USD");
        assert_eq!(detail.schedule.status, ScheduleStatus::Active);
        assert_eq!(detail.milestones.len(), 2);

        let stored = db.revenue().milestones(&detail.schedule.id).await.unwrap();
        assert_eq!(stored[0].name, "Design");
        assert_eq!(stored[0].sequence, 1);
        assert_eq!(stored[0].amount, Money::from_cents(300_000));
        assert_eq!(stored[1].percentage, dec!(70));
        assert_eq!(stored[1].target_date, Some(utc(2024, 9, 1)));
    }

    #[tokio::test]
    async fn test_create_schedule_rejects_inverted_dates() {
        let db = memory_db().await;
        let mut input = new_schedule("client-1", 1_000_000);
        input.end_date = input.start_date;

        let err = db.revenue().create_schedule(&input).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_recognition_conservation() {
        // $12,000 schedule, $5,000 recognized, then $8,000 is refused
        let db = memory_db().await;
        let detail = db
            .revenue()
            .create_schedule(&new_schedule("client-1", 1_200_000))
            .await
            .unwrap();
        let id = detail.schedule.id.as_str();

        db.revenue().recognize(id, &request(500_000), utc(2024, 5, 31)).await.unwrap();

        let err = db
            .revenue()
            .recognize(id, &request(800_000), utc(2024, 6, 30))
            .await
            .unwrap_err();
        match err {
            DbError::Domain(CoreError::ExceedsRemainingBalance {
                remaining, requested, ..
            }) => {
                assert_eq!(remaining, Money::from_cents(700_000));
                assert_eq!(requested, Money::from_cents(800_000));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(db.revenue().recognized_to_date(id).await.unwrap(), Money::from_cents(500_000));

        // exactly the remainder closes the schedule
        db.revenue().recognize(id, &request(700_000), utc(2024, 6, 30)).await.unwrap();
        let schedule = db.revenue().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(schedule.status, ScheduleStatus::FullyRecognized);

        let err = db
            .revenue()
            .recognize(id, &request(1), utc(2024, 7, 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::ExceedsRemainingBalance { remaining, .. }) if remaining == Money::zero()
        ));

        let ledger = db
            .ledger()
            .list(&LedgerFilter {
                reference_type: Some(ReferenceType::RevenueRecognition),
                reference_id: None,
            })
            .await
            .unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.iter().all(|l| l.account_type == AccountType::Revenue));
    }

    #[tokio::test]
    async fn test_recognize_unknown_schedule_and_milestone() {
        let db = memory_db().await;
        let err = db
            .revenue()
            .recognize("missing", &request(100), utc(2024, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let detail = db
            .revenue()
            .create_schedule(&new_schedule("client-1", 100_000))
            .await
            .unwrap();
        let mut req = request(100);
        req.milestone_id = Some("no-such-milestone".to_string());
        let err = db
            .revenue()
            .recognize(&detail.schedule.id, &req, utc(2024, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Milestone"));
        assert_eq!(
            db.revenue().recognized_to_date(&detail.schedule.id).await.unwrap(),
            Money::zero()
        );
    }

    #[tokio::test]
    async fn test_milestone_recognition_completes_milestone() {
        let db = memory_db().await;
        let mut input = new_schedule("client-1", 1_000_000);
        input.recognition_method = RecognitionMethod::Milestone;
        input.milestones = vec![NewMilestone {
            name: "Load-in".to_string(),
            percentage: dec!(40),
            target_date: None,
        }];
        let detail = db.revenue().create_schedule(&input).await.unwrap();
        let milestone = &detail.milestones[0];

        let mut req = request(milestone.amount.cents());
        req.milestone_id = Some(milestone.id.clone());
        let event = db
            .revenue()
            .recognize(&detail.schedule.id, &req, utc(2024, 4, 15))
            .await
            .unwrap();
        assert_eq!(event.milestone_id.as_deref(), Some(milestone.id.as_str()));

        let stored = db.revenue().milestones(&detail.schedule.id).await.unwrap();
        assert_eq!(stored[0].status, MilestoneStatus::Completed);
        assert_eq!(stored[0].completed_date, Some(utc(2024, 4, 15)));
    }

    #[tokio::test]
    async fn test_cancel_rules() {
        let db = memory_db().await;
        let fresh = db
            .revenue()
            .create_schedule(&new_schedule("client-1", 100_000))
            .await
            .unwrap();
        let cancelled = db.revenue().cancel(&fresh.schedule.id).await.unwrap();
        assert_eq!(cancelled.status, ScheduleStatus::Cancelled);

        // cancelled schedules take no recognitions
        let err = db
            .revenue()
            .recognize(&fresh.schedule.id, &request(100), utc(2024, 2, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidScheduleStatus { .. })));

        let err = db.revenue().cancel(&fresh.schedule.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidScheduleStatus { .. })));

        let used = db
            .revenue()
            .create_schedule(&new_schedule("client-2", 100_000))
            .await
            .unwrap();
        db.revenue()
            .recognize(&used.schedule.id, &request(100), utc(2024, 2, 1))
            .await
            .unwrap();
        let err = db.revenue().cancel(&used.schedule.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ScheduleHasRecognitions { .. })));

        let err = db.revenue().cancel("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_and_history_filters() {
        let db = memory_db().await;
        let a = db
            .revenue()
            .create_schedule(&new_schedule("client-a", 100_000))
            .await
            .unwrap();
        let mut input = new_schedule("client-b", 200_000);
        input.project_id = Some("tour-2024".to_string());
        let b = db.revenue().create_schedule(&input).await.unwrap();

        db.revenue().recognize(&a.schedule.id, &request(1_000), utc(2024, 2, 10)).await.unwrap();
        db.revenue().recognize(&b.schedule.id, &request(2_000), utc(2024, 3, 10)).await.unwrap();
        db.revenue().recognize(&b.schedule.id, &request(3_000), utc(2024, 4, 10)).await.unwrap();

        let by_project = db
            .revenue()
            .list(&ScheduleFilter {
                project_id: Some("tour-2024".to_string()),
                ..ScheduleFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_project.len(), 1);
        assert_eq!(by_project[0].client_id, "client-b");

        let march_on = db
            .revenue()
            .recognitions(&RecognitionFilter {
                start: Some(utc(2024, 3, 1)),
                ..RecognitionFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(march_on.len(), 2);

        let totals = db.revenue().recognized_totals().await.unwrap();
        assert_eq!(totals[&b.schedule.id], Money::from_cents(5_000));
        assert_eq!(totals[&a.schedule.id], Money::from_cents(1_000));
    }

    #[tokio::test]
    async fn test_concurrent_recognitions_never_over_commit() {
        let path = std::env::temp_dir().join(format!("atlvs-concurrency-{}.db", new_id()));
        let db = Database::new(DbConfig::new(path.clone()).max_connections(8))
            .await
            .unwrap();
        let detail = db
            .revenue()
            .create_schedule(&new_schedule("client-1", 100_000))
            .await
            .unwrap();

        // 20 requests of $100 against a $1,000 schedule
        let mut handles = Vec::new();
        for _ in 0..20 {
            let repo = db.revenue();
            let id = detail.schedule.id.clone();
            handles.push(tokio::spawn(async move {
                repo.recognize(&id, &request(10_000), utc(2024, 6, 1)).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(DbError::Domain(CoreError::ExceedsRemainingBalance { .. })) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(accepted, 10);
        assert_eq!(
            db.revenue().recognized_to_date(&detail.schedule.id).await.unwrap(),
            Money::from_cents(100_000)
        );
        let schedule = db.revenue().get_by_id(&detail.schedule.id).await.unwrap().unwrap();
        assert_eq!(schedule.status, ScheduleStatus::FullyRecognized);

        db.close().await;
        let _ = std::fs::remove_file(&path);
    }
}
