//! # Deferred Revenue Service
//!
//! Read models and write operations behind `/api/deferred-revenue`.
//!
//! ## Recognition Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /{id}/recognitions ──► recognize() ──┐                            │
//! │                                            ├──► store.recognize()       │
//! │  POST /auto-recognize ─► plan_auto_recognition() ─┘  (atomic check +    │
//! │                          one store call per plan      append + ledger)  │
//! │                                                                         │
//! │  Both paths go through the same conditional insert, so a manual and an │
//! │  automatic recognition racing on one schedule cannot overcommit it.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use atlvs_core::recognition::{
    build_waterfall, forecast_portfolio, plan_auto_recognition, project_recognition,
    schedule_standing, RecognitionProjection, ScheduleStanding, WaterfallRow,
};
use atlvs_core::reporting::{recognitions_by_month, revenue_summary, RevenueSummary};
use atlvs_core::{
    CoreError, DeferredRevenueSchedule, MonthKey, Money, NewDeferredRevenueSchedule,
    RecognitionEvent, RecognitionRequest, ScheduleStatus, ValidationError,
};
use atlvs_db::{DbError, DbResult, FinanceStore, RecognitionFilter, ScheduleDetail, ScheduleFilter};

/// Pending view only looks at schedules that ended within this window.
const PENDING_LOOKBACK_DAYS: i64 = 365;

/// Recognition history defaults to this many days before the as-of instant.
const HISTORY_WINDOW_DAYS: i64 = 365;

// =============================================================================
// Response Models
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleView {
    #[serde(flatten)]
    pub schedule: DeferredRevenueSchedule,
    #[serde(flatten)]
    pub standing: ScheduleStanding,
}

/// One schedule with its milestones and where it stands.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleDetailView {
    #[serde(flatten)]
    pub detail: ScheduleDetail,
    #[serde(flatten)]
    pub standing: ScheduleStanding,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingItem {
    #[serde(flatten)]
    pub schedule: DeferredRevenueSchedule,
    #[serde(flatten)]
    pub projection: RecognitionProjection,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingReport {
    pub pending_items: Vec<PendingItem>,
    pub total_pending: Money,
    pub as_of_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecognizedReport {
    /// Newest first.
    pub recognitions: Vec<RecognitionEvent>,
    pub by_month: BTreeMap<MonthKey, Money>,
    pub total: Money,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub forecast: BTreeMap<MonthKey, Money>,
    pub total_forecast: Money,
    pub months: u32,
    pub as_of_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaterfallReport {
    pub waterfall: Vec<WaterfallRow>,
    pub months: u32,
    pub as_of_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedRecognition {
    pub schedule_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoRecognitionReport {
    pub recognized_count: usize,
    pub total_recognized: Money,
    pub recognitions: Vec<RecognitionEvent>,
    /// Plans rejected by the store, usually because another request
    /// recognized against the schedule first.
    pub skipped: Vec<SkippedRecognition>,
    pub as_of_date: DateTime<Utc>,
}

// =============================================================================
// Reads
// =============================================================================

/// Totals over non-cancelled schedules.
pub async fn summary(store: &dyn FinanceStore) -> DbResult<RevenueSummary> {
    let schedules = store.list_schedules(&ScheduleFilter::default()).await?;
    let events = store.recognitions(&RecognitionFilter::default()).await?;
    Ok(revenue_summary(&schedules, &events))
}

/// Schedules with recognized/remaining figures and display status at `as_of`.
pub async fn schedules(
    store: &dyn FinanceStore,
    filter: &ScheduleFilter,
    as_of: DateTime<Utc>,
) -> DbResult<Vec<ScheduleView>> {
    let schedules = store.list_schedules(filter).await?;
    Ok(with_recognized(store, schedules)
        .await?
        .into_iter()
        .map(|(schedule, recognized)| ScheduleView {
            standing: schedule_standing(&schedule, recognized, as_of),
            schedule,
        })
        .collect())
}

pub async fn schedule_detail(
    store: &dyn FinanceStore,
    schedule_id: &str,
    as_of: DateTime<Utc>,
) -> DbResult<ScheduleDetailView> {
    let schedule = store.get_schedule(schedule_id).await?;
    let milestones = store.milestones(schedule_id).await?;
    let recognized: Money = store
        .recognitions(&RecognitionFilter {
            schedule_id: Some(schedule_id.to_string()),
            ..RecognitionFilter::default()
        })
        .await?
        .iter()
        .map(|r| r.amount)
        .sum();

    Ok(ScheduleDetailView {
        standing: schedule_standing(&schedule, recognized, as_of),
        detail: ScheduleDetail { schedule, milestones },
    })
}

/// Schedules behind their straight-line expectation at `as_of`.
///
/// Considers non-cancelled schedules that have started and ended no more
/// than a year before `as_of`.
pub async fn pending(store: &dyn FinanceStore, as_of: DateTime<Utc>) -> DbResult<PendingReport> {
    let horizon = as_of - Duration::days(PENDING_LOOKBACK_DAYS);
    let candidates: Vec<DeferredRevenueSchedule> = store
        .list_schedules(&ScheduleFilter::default())
        .await?
        .into_iter()
        .filter(|s| s.status != ScheduleStatus::Cancelled)
        .filter(|s| s.start_date <= as_of && s.end_date >= horizon)
        .collect();

    let pending_items: Vec<PendingItem> = with_recognized(store, candidates)
        .await?
        .into_iter()
        .map(|(schedule, recognized)| PendingItem {
            projection: project_recognition(&schedule, recognized, as_of),
            schedule,
        })
        .filter(|item| item.projection.pending.is_positive())
        .collect();

    Ok(PendingReport {
        total_pending: pending_items.iter().map(|i| i.projection.pending).sum(),
        pending_items,
        as_of_date: as_of,
    })
}

/// Recognition history in `[start, end]`, defaulting to the year up to `as_of`.
pub async fn recognized(
    store: &dyn FinanceStore,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    as_of: DateTime<Utc>,
) -> DbResult<RecognizedReport> {
    let start_date = start.unwrap_or(as_of - Duration::days(HISTORY_WINDOW_DAYS));
    let end_date = end.unwrap_or(as_of);
    if end_date < start_date {
        return Err(CoreError::from(ValidationError::InvalidDateRange {
            start_field: "start_date".to_string(),
            end_field: "end_date".to_string(),
        })
        .into());
    }

    let mut recognitions = store
        .recognitions(&RecognitionFilter {
            schedule_id: None,
            start: Some(start_date),
            end: Some(end_date),
        })
        .await?;
    recognitions.sort_by(|a, b| {
        b.recognition_date
            .cmp(&a.recognition_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    Ok(RecognizedReport {
        by_month: recognitions_by_month(&recognitions),
        total: recognitions.iter().map(|r| r.amount).sum(),
        recognitions,
        start_date,
        end_date,
    })
}

/// Forward `months` buckets starting with the month of `as_of`.
pub async fn forecast(
    store: &dyn FinanceStore,
    months: u32,
    as_of: DateTime<Utc>,
) -> DbResult<ForecastReport> {
    let schedules = store.list_schedules(&ScheduleFilter::default()).await?;
    let with_totals = with_recognized(store, schedules).await?;
    let forecast = forecast_portfolio(&with_totals, as_of, months)?;

    Ok(ForecastReport {
        forecast: forecast.buckets,
        total_forecast: forecast.total,
        months,
        as_of_date: as_of,
    })
}

/// Trailing `months` roll-forward rows ending with the month of `as_of`.
pub async fn waterfall(
    store: &dyn FinanceStore,
    months: u32,
    as_of: DateTime<Utc>,
) -> DbResult<WaterfallReport> {
    let schedules = store.list_schedules(&ScheduleFilter::default()).await?;
    let events = store.recognitions(&RecognitionFilter::default()).await?;
    let waterfall = build_waterfall(&schedules, &events, as_of, months)?;

    if let Some(row) = waterfall.iter().find(|r| r.negative_balance) {
        warn!(month = %row.month, closing = %row.closing, "Waterfall closing balance below zero");
    }

    Ok(WaterfallReport {
        waterfall,
        months,
        as_of_date: as_of,
    })
}

/// Pairs each schedule with its recognized-to-date amount.
async fn with_recognized(
    store: &dyn FinanceStore,
    schedules: Vec<DeferredRevenueSchedule>,
) -> DbResult<Vec<(DeferredRevenueSchedule, Money)>> {
    let totals = store.recognized_totals().await?;
    Ok(schedules
        .into_iter()
        .map(|s| {
            let recognized = totals.get(&s.id).copied().unwrap_or_default();
            (s, recognized)
        })
        .collect())
}

// =============================================================================
// Writes
// =============================================================================

pub async fn create_schedule(
    store: &dyn FinanceStore,
    input: &NewDeferredRevenueSchedule,
) -> DbResult<ScheduleDetail> {
    let detail = store.create_schedule(input).await?;
    info!(
        schedule_id = %detail.schedule.id,
        total = %detail.schedule.total_amount,
        milestones = detail.milestones.len(),
        "Deferred revenue schedule created"
    );
    Ok(detail)
}

/// Recognizes against one schedule; the event is dated `as_of` when the
/// request carries no date.
pub async fn recognize(
    store: &dyn FinanceStore,
    schedule_id: &str,
    request: &RecognitionRequest,
    as_of: DateTime<Utc>,
) -> DbResult<RecognitionEvent> {
    let recognition_date = request.recognition_date.unwrap_or(as_of);
    let event = store.recognize(schedule_id, request, recognition_date).await?;
    info!(
        schedule_id = %schedule_id,
        recognition_id = %event.id,
        amount = %event.amount,
        "Revenue recognized"
    );
    Ok(event)
}

/// Catches every active straight-line schedule up to its expectation at `as_of`.
///
/// Each posting commits on its own. A plan the store rejects on business
/// grounds is reported in `skipped`; a storage failure stops the batch.
pub async fn auto_recognize(
    store: &dyn FinanceStore,
    as_of: DateTime<Utc>,
) -> DbResult<AutoRecognitionReport> {
    let schedules = store
        .list_schedules(&ScheduleFilter {
            status: Some(ScheduleStatus::Active),
            ..ScheduleFilter::default()
        })
        .await?;
    let with_totals = with_recognized(store, schedules).await?;
    let plans = plan_auto_recognition(&with_totals, as_of);

    let mut recognitions = Vec::with_capacity(plans.len());
    let mut skipped = Vec::new();

    for plan in plans {
        let request = RecognitionRequest {
            amount: plan.amount,
            recognition_date: Some(plan.recognition_date),
            milestone_id: None,
            notes: Some(plan.notes.clone()),
        };

        match store
            .recognize(&plan.schedule_id, &request, plan.recognition_date)
            .await
        {
            Ok(event) => recognitions.push(event),
            Err(DbError::Domain(e)) => {
                warn!(schedule_id = %plan.schedule_id, error = %e, "Auto-recognition skipped");
                skipped.push(SkippedRecognition {
                    schedule_id: plan.schedule_id,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    let total_recognized: Money = recognitions.iter().map(|r| r.amount).sum();
    info!(
        as_of = %as_of,
        count = recognitions.len(),
        total = %total_recognized,
        "Auto-recognition complete"
    );

    Ok(AutoRecognitionReport {
        recognized_count: recognitions.len(),
        total_recognized,
        recognitions,
        skipped,
        as_of_date: as_of,
    })
}

pub async fn cancel_schedule(
    store: &dyn FinanceStore,
    schedule_id: &str,
) -> DbResult<DeferredRevenueSchedule> {
    let schedule = store.cancel_schedule(schedule_id).await?;
    info!(schedule_id = %schedule_id, "Deferred revenue schedule cancelled");
    Ok(schedule)
}

// =============================================================================
// Unit Tests
// =============================================================================
