//! # Recognition Module
//!
//! Deferred-revenue math: what should have been earned by an as-of
//! instant, how the unearned balance spreads over coming months, the
//! trailing waterfall, and the checks guarding each recognition.
//!
//! ## Straight-Line Projection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  $12,000.00 schedule, 2024-01-01 → 2024-12-31 (365 days)               │
//! │                                                                         │
//! │  start ───────────────── as_of ─────────────────────────────── end      │
//! │         182 days elapsed        183 days remaining                      │
//! │                                                                         │
//! │  expected  = 12000 / 365 × 182 = $5,983.56                             │
//! │  pending   = max(0, expected - recognized)                             │
//! │  remaining = total - recognized                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only straight-line schedules have a formula. Milestone, percentage
//! completion and deliverable schedules move only through explicit
//! recognitions.
//!
//! ## Forecast Buckets
//! The unrecognized balance is spread at a constant daily rate from
//! `max(start, as_of)` to `end`, then cut into half-open calendar months
//! starting with the month containing `as_of`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::dates::{day_span, overlap_days, MonthKey};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{
    DeferredRevenueSchedule, NewMilestone, RecognitionEvent, RecognitionMethod, ScheduleStatus,
};
use crate::validation::{validate_positive_amount, validate_report_months};

/// Note attached to recognitions posted by the auto-recognition job.
pub const AUTO_RECOGNITION_NOTE: &str = "Auto-recognized (straight-line)";

/// The auto-recognition job only posts when the unrounded shortfall is
/// strictly greater than this.
pub const AUTO_RECOGNITION_THRESHOLD: Money = Money::from_cents(1);

// =============================================================================
// Projection
// =============================================================================

/// Expected, pending and remaining amounts of one schedule at an as-of instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct RecognitionProjection {
    /// What straight-line recognition says should be earned by now.
    pub expected: Money,
    /// `max(0, expected - recognized)`.
    pub pending: Money,
    pub recognized: Money,
    /// `total - recognized`.
    pub remaining: Money,
}

/// Unrounded straight-line expectation; zero for every other method.
fn expected_unrounded(schedule: &DeferredRevenueSchedule, as_of: DateTime<Utc>) -> Decimal {
    if schedule.recognition_method != RecognitionMethod::StraightLine {
        return Decimal::ZERO;
    }

    let total_days = day_span(schedule.start_date, schedule.end_date);
    if total_days <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let elapsed = day_span(schedule.start_date, as_of)
        .max(Decimal::ZERO)
        .min(total_days);
    schedule.total_amount.to_decimal() / total_days * elapsed
}

/// Straight-line expected recognition at `as_of`, rounded to cents.
pub fn expected_recognition(schedule: &DeferredRevenueSchedule, as_of: DateTime<Utc>) -> Money {
    Money::from_decimal(expected_unrounded(schedule, as_of))
}

/// Projects a schedule at `as_of` given what has been recognized so far.
///
/// ## Example
/// ```rust
/// # use atlvs_core::recognition::project_recognition;
/// # use atlvs_core::*;
/// # use chrono::{TimeZone, Utc};
/// # let day = |m, d| Utc.with_ymd_and_hms(2024, m, d, 0, 0, 0).unwrap();
/// # let schedule = DeferredRevenueSchedule {
/// #     id: "dr-1".into(), client_id: "c-1".into(), project_id: None,
/// #     contract_id: None, invoice_id: None,
/// #     total_amount: Money::from_major_minor(12_000, 0), currency: "USD".into(),
/// #     recognition_method: RecognitionMethod::StraightLine,
/// #     start_date: day(1, 1), end_date: day(12, 31), description: None,
/// #     status: ScheduleStatus::Active, created_at: day(1, 1), updated_at: day(1, 1),
/// # };
/// let projection = project_recognition(&schedule, Money::zero(), day(7, 1));
/// assert_eq!(projection.expected, Money::from_cents(598_356));
/// assert_eq!(projection.pending, Money::from_cents(598_356));
/// ```
pub fn project_recognition(
    schedule: &DeferredRevenueSchedule,
    recognized: Money,
    as_of: DateTime<Utc>,
) -> RecognitionProjection {
    let expected = expected_unrounded(schedule, as_of);
    let pending = (expected - recognized.to_decimal()).max(Decimal::ZERO);

    RecognitionProjection {
        expected: Money::from_decimal(expected),
        pending: Money::from_decimal(pending),
        recognized,
        remaining: schedule.total_amount - recognized,
    }
}

// =============================================================================
// Forecast
// =============================================================================

/// Month-by-month forecast of future recognition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct MonthlyForecast {
    /// Every requested month is present, zero when nothing lands in it.
    #[ts(type = "Record<string, number>")]
    pub buckets: BTreeMap<MonthKey, Money>,
    /// Sum of the rounded buckets.
    pub total: Money,
}

impl MonthlyForecast {
    fn from_unrounded(buckets: BTreeMap<MonthKey, Decimal>) -> Self {
        let buckets: BTreeMap<MonthKey, Money> = buckets
            .into_iter()
            .map(|(month, amount)| (month, Money::from_decimal(amount)))
            .collect();
        let total = buckets.values().sum();
        MonthlyForecast { buckets, total }
    }
}

/// Empty buckets for the `months` calendar months starting at `as_of`.
fn empty_buckets(as_of: DateTime<Utc>, months: u32) -> BTreeMap<MonthKey, Decimal> {
    let first = MonthKey::of(as_of);
    (0..months as i32)
        .map(|i| (first.offset(i), Decimal::ZERO))
        .collect()
}

/// Adds one schedule's remaining balance into `buckets`.
fn accumulate_forecast(
    buckets: &mut BTreeMap<MonthKey, Decimal>,
    schedule: &DeferredRevenueSchedule,
    recognized: Money,
    as_of: DateTime<Utc>,
) {
    let remaining = (schedule.total_amount - recognized).to_decimal();
    if remaining <= Decimal::ZERO {
        return;
    }

    let effective_start = schedule.start_date.max(as_of);
    let remaining_days = day_span(effective_start, schedule.end_date).max(Decimal::ONE);
    let daily_rate = remaining / remaining_days;

    for (month, amount) in buckets.iter_mut() {
        let days = overlap_days(
            month.start(),
            month.end_exclusive(),
            effective_start,
            schedule.end_date,
        );
        *amount += daily_rate * days;
    }
}

/// Spreads one schedule's unrecognized balance over `months` calendar months.
///
/// ## Errors
/// `Validation` when `months` is outside 1-60.
pub fn forecast_monthly(
    schedule: &DeferredRevenueSchedule,
    recognized: Money,
    as_of: DateTime<Utc>,
    months: u32,
) -> CoreResult<MonthlyForecast> {
    validate_report_months(months)?;
    let mut buckets = empty_buckets(as_of, months);
    accumulate_forecast(&mut buckets, schedule, recognized, as_of);
    Ok(MonthlyForecast::from_unrounded(buckets))
}

/// Forecast across a portfolio, summed before rounding.
///
/// Only active schedules that have not ended by `as_of` and still carry a
/// balance contribute.
pub fn forecast_portfolio(
    schedules: &[(DeferredRevenueSchedule, Money)],
    as_of: DateTime<Utc>,
    months: u32,
) -> CoreResult<MonthlyForecast> {
    validate_report_months(months)?;
    let mut buckets = empty_buckets(as_of, months);

    for (schedule, recognized) in schedules {
        if schedule.status != ScheduleStatus::Active || schedule.end_date < as_of {
            continue;
        }
        accumulate_forecast(&mut buckets, schedule, *recognized, as_of);
    }

    Ok(MonthlyForecast::from_unrounded(buckets))
}

// =============================================================================
// Waterfall
// =============================================================================

/// One month of the deferred revenue roll-forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct WaterfallRow {
    #[ts(as = "String")]
    pub month: MonthKey,
    pub opening: Money,
    pub additions: Money,
    pub recognized: Money,
    /// `opening + additions - recognized`; never clamped.
    pub closing: Money,
    /// Set when `closing` is below zero, which only happens when the
    /// window starts after schedules whose recognitions fall inside it.
    pub negative_balance: bool,
}

/// Trailing `months` months ending with the month of `as_of`, oldest first.
///
/// The first row opens at zero, so balances reflect only activity inside
/// the window.
pub fn build_waterfall(
    schedules: &[DeferredRevenueSchedule],
    events: &[RecognitionEvent],
    as_of: DateTime<Utc>,
    months: u32,
) -> CoreResult<Vec<WaterfallRow>> {
    validate_report_months(months)?;

    let last = MonthKey::of(as_of);
    let first = last.offset(1 - months as i32);

    let mut additions: BTreeMap<MonthKey, Money> = BTreeMap::new();
    for schedule in schedules {
        *additions.entry(MonthKey::of(schedule.start_date)).or_default() += schedule.total_amount;
    }

    let mut recognized: BTreeMap<MonthKey, Money> = BTreeMap::new();
    for event in events {
        *recognized.entry(MonthKey::of(event.recognition_date)).or_default() += event.amount;
    }

    let mut rows = Vec::with_capacity(months as usize);
    let mut opening = Money::zero();

    for i in 0..months as i32 {
        let month = first.offset(i);
        let added = additions.get(&month).copied().unwrap_or_default();
        let earned = recognized.get(&month).copied().unwrap_or_default();
        let closing = opening + added - earned;

        rows.push(WaterfallRow {
            month,
            opening,
            additions: added,
            recognized: earned,
            closing,
            negative_balance: closing.is_negative(),
        });
        opening = closing;
    }

    Ok(rows)
}

// =============================================================================
// Recognition Checks
// =============================================================================

/// State of a schedule after a recognition would be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognitionOutcome {
    pub recognized_after: Money,
    pub remaining_after: Money,
    /// The schedule should move to `fully_recognized`.
    pub fully_recognized: bool,
}

/// Checks whether `amount` may be recognized against `schedule`.
///
/// The record store repeats this check atomically when it appends the
/// event; this version serves callers that want to reject early.
///
/// ## Errors
/// - `Validation` for a non-positive amount
/// - `InvalidScheduleStatus` for a cancelled schedule
/// - `ExceedsRemainingBalance` when `amount > total - recognized`
pub fn check_recognition(
    schedule: &DeferredRevenueSchedule,
    recognized: Money,
    amount: Money,
) -> CoreResult<RecognitionOutcome> {
    validate_positive_amount("amount", amount)?;

    if schedule.status == ScheduleStatus::Cancelled {
        return Err(CoreError::InvalidScheduleStatus {
            schedule_id: schedule.id.clone(),
            status: schedule.status.as_str().to_string(),
        });
    }

    let remaining = schedule.total_amount - recognized;
    if amount > remaining {
        return Err(CoreError::ExceedsRemainingBalance {
            schedule_id: schedule.id.clone(),
            remaining,
            requested: amount,
        });
    }

    let recognized_after = recognized + amount;
    Ok(RecognitionOutcome {
        recognized_after,
        remaining_after: schedule.total_amount - recognized_after,
        fully_recognized: recognized_after >= schedule.total_amount,
    })
}

/// A catch-up recognition the auto-recognition job will post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct PlannedRecognition {
    pub schedule_id: String,
    pub amount: Money,
    #[ts(as = "String")]
    pub recognition_date: DateTime<Utc>,
    pub notes: String,
}

/// Catch-up recognitions for every active straight-line schedule that has
/// started by `as_of` and is behind by more than one cent.
///
/// The shortfall is measured against the unrounded expectation and only
/// then rounded into the posted amount. Because the expectation never
/// exceeds the total, the posting never exceeds the remaining balance.
pub fn plan_auto_recognition(
    schedules: &[(DeferredRevenueSchedule, Money)],
    as_of: DateTime<Utc>,
) -> Vec<PlannedRecognition> {
    schedules
        .iter()
        .filter(|(s, _)| {
            s.status == ScheduleStatus::Active
                && s.recognition_method == RecognitionMethod::StraightLine
                && s.start_date <= as_of
        })
        .filter_map(|(schedule, recognized)| {
            let shortfall = expected_unrounded(schedule, as_of) - recognized.to_decimal();
            (shortfall > AUTO_RECOGNITION_THRESHOLD.to_decimal()).then(|| PlannedRecognition {
                schedule_id: schedule.id.clone(),
                amount: Money::from_decimal(shortfall),
                recognition_date: as_of,
                notes: AUTO_RECOGNITION_NOTE.to_string(),
            })
        })
        .collect()
}

// =============================================================================
// Standing & Lifecycle
// =============================================================================

/// Status shown on the schedules screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    Active,
    Overdue,
    FullyRecognized,
    Cancelled,
}

/// Recognized/remaining figures plus the derived display status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ScheduleStanding {
    pub recognized: Money,
    pub remaining: Money,
    /// 0-100, two decimal places.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub percent_recognized: Decimal,
    pub display_status: DisplayStatus,
}

/// Derives a schedule's standing at `as_of`.
///
/// A schedule past its end date with a balance left is `overdue`.
pub fn schedule_standing(
    schedule: &DeferredRevenueSchedule,
    recognized: Money,
    as_of: DateTime<Utc>,
) -> ScheduleStanding {
    let remaining = schedule.total_amount - recognized;
    let display_status = if schedule.status == ScheduleStatus::Cancelled {
        DisplayStatus::Cancelled
    } else if !remaining.is_positive() {
        DisplayStatus::FullyRecognized
    } else if schedule.end_date < as_of {
        DisplayStatus::Overdue
    } else {
        DisplayStatus::Active
    };

    ScheduleStanding {
        recognized,
        remaining,
        percent_recognized: recognized.percent_of(schedule.total_amount),
        display_status,
    }
}

/// A schedule may be cancelled only while active and without recognitions.
pub fn can_cancel(schedule: &DeferredRevenueSchedule, event_count: usize) -> CoreResult<()> {
    if event_count > 0 {
        return Err(CoreError::ScheduleHasRecognitions {
            schedule_id: schedule.id.clone(),
        });
    }
    if schedule.status != ScheduleStatus::Active {
        return Err(CoreError::InvalidScheduleStatus {
            schedule_id: schedule.id.clone(),
            status: schedule.status.as_str().to_string(),
        });
    }
    Ok(())
}

/// A milestone ready to be stored, before it gets an id.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMilestone {
    pub name: String,
    pub percentage: Decimal,
    pub amount: Money,
    pub target_date: Option<DateTime<Utc>>,
    pub sequence: i64,
}

/// Milestone amounts (`total × pct / 100`) and 1-based sequence numbers
/// in input order.
pub fn plan_milestones(total: Money, milestones: &[NewMilestone]) -> Vec<PlannedMilestone> {
    milestones
        .iter()
        .zip(1..)
        .map(|(m, sequence)| PlannedMilestone {
            name: m.name.trim().to_string(),
            percentage: m.percentage,
            amount: total.percent(m.percentage),
            target_date: m.target_date,
            sequence,
        })
        .collect()
}

/// Sum of event amounts.
pub fn total_recognized<'a>(events: impl IntoIterator<Item = &'a RecognitionEvent>) -> Money {
    events.into_iter().map(|e| e.amount).sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn schedule(total_major: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> DeferredRevenueSchedule {
        DeferredRevenueSchedule {
            id: "dr-1".to_string(),
            client_id: "client-1".to_string(),
            project_id: None,
            contract_id: None,
            invoice_id: None,
            total_amount: Money::from_major_minor(total_major, 0),
            currency: "USD".to_string(),
            recognition_method: RecognitionMethod::StraightLine,
            start_date: start,
            end_date: end,
            description: None,
            status: ScheduleStatus::Active,
            created_at: start,
            updated_at: start,
        }
    }

    fn event(id: &str, amount: Money, at: DateTime<Utc>) -> RecognitionEvent {
        RecognitionEvent {
            id: id.to_string(),
            schedule_id: "dr-1".to_string(),
            amount,
            recognition_date: at,
            milestone_id: None,
            notes: None,
            created_at: at,
        }
    }

    fn year_2024() -> DeferredRevenueSchedule {
        schedule(12_000, utc(2024, 1, 1), utc(2024, 12, 31))
    }

    // ----- projection -----

    #[test]
    fn test_expected_recognition_mid_year() {
        let s = year_2024();
        let p = project_recognition(&s, Money::zero(), utc(2024, 7, 1));
        assert_eq!(p.expected, Money::from_cents(598_356));
        assert_eq!(p.pending, Money::from_cents(598_356));
        assert_eq!(p.remaining, Money::from_major_minor(12_000, 0));
    }

    #[test]
    fn test_expected_is_clamped_to_schedule_window() {
        let s = year_2024();
        assert_eq!(expected_recognition(&s, utc(2023, 6, 1)), Money::zero());
        assert_eq!(
            expected_recognition(&s, utc(2026, 1, 1)),
            Money::from_major_minor(12_000, 0)
        );
    }

    #[test]
    fn test_pending_never_negative() {
        let s = year_2024();
        let p = project_recognition(&s, Money::from_major_minor(9_000, 0), utc(2024, 7, 1));
        assert_eq!(p.pending, Money::zero());
        assert_eq!(p.remaining, Money::from_major_minor(3_000, 0));
    }

    #[test]
    fn test_milestone_schedules_have_no_formula() {
        let mut s = year_2024();
        s.recognition_method = RecognitionMethod::Milestone;
        let p = project_recognition(&s, Money::zero(), utc(2024, 7, 1));
        assert_eq!(p.expected, Money::zero());
        assert_eq!(p.pending, Money::zero());
    }

    // ----- forecast -----

    #[test]
    fn test_forecast_buckets_are_calendar_months() {
        // 92 days, $9,200 → $100/day
        let s = schedule(9_200, utc(2024, 3, 1), utc(2024, 6, 1));
        let f = forecast_monthly(&s, Money::zero(), utc(2024, 3, 1), 4).unwrap();

        let amounts: Vec<i64> = f.buckets.values().map(|m| m.cents()).collect();
        assert_eq!(amounts, vec![310_000, 300_000, 310_000, 0]);
        assert_eq!(f.total, Money::from_major_minor(9_200, 0));
        assert_eq!(f.buckets.keys().next().unwrap().to_string(), "2024-03");
    }

    #[test]
    fn test_forecast_uses_remaining_balance_from_as_of() {
        let s = schedule(9_200, utc(2024, 3, 1), utc(2024, 6, 1));
        // 61 days left, $6,100 unrecognized → still $100/day
        let f = forecast_monthly(&s, Money::from_major_minor(3_100, 0), utc(2024, 4, 1), 3).unwrap();
        let amounts: Vec<i64> = f.buckets.values().map(|m| m.cents()).collect();
        assert_eq!(amounts, vec![300_000, 310_000, 0]);
    }

    #[test]
    fn test_forecast_rounding_drift_is_bounded() {
        let s = schedule(1_000, utc(2024, 1, 1), utc(2024, 12, 31));
        let f = forecast_monthly(&s, Money::zero(), utc(2024, 1, 1), 12).unwrap();
        let drift = (f.total - Money::from_major_minor(1_000, 0)).cents().abs();
        assert!(drift <= 6, "drift {} cents", drift);
    }

    #[test]
    fn test_forecast_portfolio_skips_inactive_and_ended() {
        let active = year_2024();
        let mut cancelled = year_2024();
        cancelled.status = ScheduleStatus::Cancelled;
        let ended = schedule(5_000, utc(2023, 1, 1), utc(2023, 6, 1));

        let portfolio = vec![
            (active.clone(), Money::zero()),
            (cancelled, Money::zero()),
            (ended, Money::zero()),
        ];
        let combined = forecast_portfolio(&portfolio, utc(2024, 1, 1), 12).unwrap();
        let single = forecast_monthly(&active, Money::zero(), utc(2024, 1, 1), 12).unwrap();
        assert_eq!(combined, single);
    }

    #[test]
    fn test_forecast_rejects_bad_window() {
        let s = year_2024();
        assert!(forecast_monthly(&s, Money::zero(), utc(2024, 1, 1), 0).is_err());
        assert!(forecast_monthly(&s, Money::zero(), utc(2024, 1, 1), 61).is_err());
    }

    // ----- waterfall -----

    #[test]
    fn test_waterfall_identity() {
        let s1 = schedule(12_000, utc(2024, 1, 15), utc(2024, 12, 31));
        let s2 = schedule(6_000, utc(2024, 3, 1), utc(2024, 8, 31));
        let events = vec![
            event("r1", Money::from_major_minor(1_000, 0), utc(2024, 1, 31)),
            event("r2", Money::from_major_minor(2_000, 0), utc(2024, 3, 31)),
            event("r3", Money::from_major_minor(500, 0), utc(2024, 4, 30)),
        ];

        let rows = build_waterfall(&[s1, s2], &events, utc(2024, 4, 15), 4).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].month.to_string(), "2024-01");
        assert_eq!(rows[3].month.to_string(), "2024-04");
        assert_eq!(rows[0].opening, Money::zero());

        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.closing, row.opening + row.additions - row.recognized);
            if i > 0 {
                assert_eq!(row.opening, rows[i - 1].closing);
            }
            assert!(!row.negative_balance);
        }
        assert_eq!(rows[3].closing, Money::from_major_minor(14_500, 0));
    }

    #[test]
    fn test_waterfall_flags_negative_balance() {
        // Schedule added before the window, recognized inside it
        let s = schedule(12_000, utc(2023, 6, 1), utc(2024, 6, 1));
        let events = vec![event("r1", Money::from_major_minor(1_000, 0), utc(2024, 2, 1))];

        let rows = build_waterfall(&[s], &events, utc(2024, 3, 1), 3).unwrap();
        assert_eq!(rows[1].closing, Money::from_major_minor(-1_000, 0));
        assert!(rows[1].negative_balance);
        assert!(!rows[0].negative_balance);
    }

    // ----- recognition checks -----

    #[test]
    fn test_check_recognition_scenarios() {
        let s = year_2024();

        let ok = check_recognition(&s, Money::zero(), Money::from_major_minor(6_000, 0)).unwrap();
        assert_eq!(ok.remaining_after, Money::from_major_minor(6_000, 0));
        assert!(!ok.fully_recognized);

        assert!(matches!(
            check_recognition(&s, Money::zero(), Money::from_major_minor(13_000, 0)),
            Err(CoreError::ExceedsRemainingBalance { .. })
        ));

        // 5000 then 8000 on 12000
        let after_first = check_recognition(&s, Money::zero(), Money::from_major_minor(5_000, 0))
            .unwrap()
            .recognized_after;
        match check_recognition(&s, after_first, Money::from_major_minor(8_000, 0)) {
            Err(CoreError::ExceedsRemainingBalance { remaining, requested, .. }) => {
                assert_eq!(remaining, Money::from_major_minor(7_000, 0));
                assert_eq!(requested, Money::from_major_minor(8_000, 0));
            }
            other => panic!("expected ExceedsRemainingBalance, got {:?}", other),
        }
    }

    #[test]
    fn test_check_recognition_boundary() {
        let s = year_2024();
        let recognized = Money::from_major_minor(4_000, 0);
        let remaining = s.total_amount - recognized;

        let exact = check_recognition(&s, recognized, remaining).unwrap();
        assert!(exact.fully_recognized);
        assert_eq!(exact.remaining_after, Money::zero());

        assert!(check_recognition(&s, recognized, remaining + Money::from_cents(1)).is_err());
    }

    #[test]
    fn test_check_recognition_rejects_cancelled_and_non_positive() {
        let mut s = year_2024();
        assert!(matches!(
            check_recognition(&s, Money::zero(), Money::zero()),
            Err(CoreError::Validation(_))
        ));

        s.status = ScheduleStatus::Cancelled;
        assert!(matches!(
            check_recognition(&s, Money::zero(), Money::from_cents(100)),
            Err(CoreError::InvalidScheduleStatus { .. })
        ));
    }

    // ----- auto recognition -----

    #[test]
    fn test_plan_auto_recognition() {
        let behind = year_2024();
        let mut caught_up = year_2024();
        caught_up.id = "dr-2".to_string();
        let mut milestone = year_2024();
        milestone.id = "dr-3".to_string();
        milestone.recognition_method = RecognitionMethod::Milestone;
        let mut future = schedule(1_000, utc(2025, 1, 1), utc(2025, 12, 31));
        future.id = "dr-4".to_string();

        let as_of = utc(2024, 7, 1);
        let portfolio = vec![
            (behind, Money::from_major_minor(5_000, 0)),
            (caught_up, Money::from_cents(598_356)),
            (milestone, Money::zero()),
            (future, Money::zero()),
        ];

        let planned = plan_auto_recognition(&portfolio, as_of);
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].schedule_id, "dr-1");
        assert_eq!(planned[0].amount, Money::from_cents(98_356));
        assert_eq!(planned[0].notes, AUTO_RECOGNITION_NOTE);
        assert_eq!(planned[0].recognition_date, as_of);
    }

    #[test]
    fn test_auto_recognition_uses_unrounded_shortfall() {
        // expected is 5983.5616..., so 5983.55 is 0.0116 behind
        let portfolio = vec![(year_2024(), Money::from_cents(598_355))];
        let planned = plan_auto_recognition(&portfolio, utc(2024, 7, 1));
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].amount, Money::from_cents(1));
    }

    #[test]
    fn test_auto_recognition_skips_exactly_one_cent() {
        // 365.00 over 365 days earns exactly 1.00 a day; 182.00 by July 1st
        let s = schedule(365, utc(2024, 1, 1), utc(2024, 12, 31));
        let as_of = utc(2024, 7, 1);

        let one_cent = vec![(s.clone(), Money::from_cents(18_199))];
        assert!(plan_auto_recognition(&one_cent, as_of).is_empty());

        let two_cents = vec![(s, Money::from_cents(18_198))];
        let planned = plan_auto_recognition(&two_cents, as_of);
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].amount, Money::from_cents(2));
    }

    // ----- standing -----

    #[test]
    fn test_schedule_standing() {
        let s = year_2024();

        let standing = schedule_standing(&s, Money::from_major_minor(4_000, 0), utc(2024, 6, 1));
        assert_eq!(standing.display_status, DisplayStatus::Active);
        assert_eq!(standing.percent_recognized, dec!(33.33));

        let overdue = schedule_standing(&s, Money::from_major_minor(4_000, 0), utc(2025, 2, 1));
        assert_eq!(overdue.display_status, DisplayStatus::Overdue);

        let done = schedule_standing(&s, s.total_amount, utc(2025, 2, 1));
        assert_eq!(done.display_status, DisplayStatus::FullyRecognized);
        assert_eq!(done.percent_recognized, dec!(100));
    }

    #[test]
    fn test_can_cancel() {
        let mut s = year_2024();
        assert!(can_cancel(&s, 0).is_ok());
        assert!(matches!(
            can_cancel(&s, 1),
            Err(CoreError::ScheduleHasRecognitions { .. })
        ));

        s.status = ScheduleStatus::Cancelled;
        assert!(matches!(
            can_cancel(&s, 0),
            Err(CoreError::InvalidScheduleStatus { .. })
        ));
    }

    #[test]
    fn test_plan_milestones() {
        let inputs = vec![
            NewMilestone {
                name: " Kickoff ".to_string(),
                percentage: dec!(25),
                target_date: None,
            },
            NewMilestone {
                name: "Delivery".to_string(),
                percentage: dec!(75),
                target_date: Some(utc(2024, 6, 1)),
            },
        ];
        let planned = plan_milestones(Money::from_major_minor(10_000, 0), &inputs);
        assert_eq!(planned[0].name, "Kickoff");
        assert_eq!(planned[0].amount, Money::from_major_minor(2_500, 0));
        assert_eq!(planned[0].sequence, 1);
        assert_eq!(planned[1].amount, Money::from_major_minor(7_500, 0));
        assert_eq!(planned[1].sequence, 2);
    }

    #[test]
    fn test_total_recognized() {
        let at = utc(2024, 1, 1) + Duration::days(3);
        let events = vec![
            event("a", Money::from_cents(100), at),
            event("b", Money::from_cents(250), at),
        ];
        assert_eq!(total_recognized(&events), Money::from_cents(350));
    }
}
