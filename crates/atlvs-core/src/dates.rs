//! # Dates Module
//!
//! Day arithmetic shared by the depreciation and recognition calculators.
//!
//! ## Two Notions of "Month"
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OWNERSHIP MONTHS (depreciation)                                        │
//! │    months_owned = floor(elapsed_days / 30.44)                           │
//! │    2020-01-01 + 914 days → 914 / 30.44 = 30.03 → 30 months             │
//! │                                                                         │
//! │  CALENDAR MONTHS (forecast, waterfall, period runs)                     │
//! │    MonthKey(2024-03) covers [2024-03-01T00:00Z, 2024-04-01T00:00Z)      │
//! │    Half-open, so a boundary instant belongs to exactly one bucket       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All instants are UTC. Day counts are fractional (milliseconds / 86,400,000)
//! and are computed in `Decimal` so the 30.44 divisor is exact.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// =============================================================================
// Constants
// =============================================================================

/// Average days per month used for ownership months.
pub const AVERAGE_DAYS_PER_MONTH: Decimal = dec!(30.44);

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

// =============================================================================
// Day Arithmetic
// =============================================================================

/// Fractional days from `from` to `to` (negative when `to` is earlier).
pub fn day_span(from: DateTime<Utc>, to: DateTime<Utc>) -> Decimal {
    let millis = to.signed_duration_since(from).num_milliseconds();
    Decimal::from(millis) / Decimal::from(MILLIS_PER_DAY)
}

/// Whole 30.44-day months between acquisition and `as_of`.
///
/// An `as_of` before the acquisition date yields 0.
///
/// ## Example
/// ```rust
/// use atlvs_core::dates::months_owned;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let acquired = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
/// assert_eq!(months_owned(acquired, acquired + Duration::days(914)), 30);
/// assert_eq!(months_owned(acquired, acquired + Duration::days(912)), 29);
/// assert_eq!(months_owned(acquired, acquired - Duration::days(10)), 0);
/// ```
pub fn months_owned(acquired: DateTime<Utc>, as_of: DateTime<Utc>) -> i64 {
    let days = day_span(acquired, as_of);
    if days <= Decimal::ZERO {
        return 0;
    }
    (days / AVERAGE_DAYS_PER_MONTH)
        .floor()
        .to_i64()
        .unwrap_or(0)
}

/// Overlap in fractional days of `[a_start, a_end)` and `[b_start, b_end)`.
///
/// Zero when the ranges do not intersect.
pub fn overlap_days(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> Decimal {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    if end <= start {
        Decimal::ZERO
    } else {
        day_span(start, end)
    }
}

/// Midnight UTC at the start of a calendar date.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// Parses an instant from RFC 3339 (`2024-07-01T12:00:00Z`) or a bare
/// date (`2024-07-01`, taken as midnight UTC).
pub fn parse_instant(field: &str, value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(start_of_day)
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("'{}' is not an RFC 3339 instant or YYYY-MM-DD date", value),
        })
}

/// Serde helpers for request fields that accept either an RFC 3339 instant
/// or a bare `YYYY-MM-DD` date.
///
/// ```ignore
/// #[serde(deserialize_with = "crate::dates::flexible::deserialize")]
/// pub acquisition_date: DateTime<Utc>,
/// ```
pub mod flexible {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_instant("date", &raw).map_err(de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de, Deserialize, Deserializer};

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) if !raw.trim().is_empty() => super::super::parse_instant("date", &raw)
                    .map(Some)
                    .map_err(de::Error::custom),
                _ => Ok(None),
            }
        }
    }
}

// =============================================================================
// MonthKey
// =============================================================================

/// A calendar month in UTC, rendered as `YYYY-MM`.
///
/// Ordering is chronological, so `BTreeMap<MonthKey, _>` iterates in
/// month order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

/// A month used as the unit of a depreciation run.
pub type AccountingPeriod = MonthKey;

impl MonthKey {
    /// Builds a key, rejecting months outside 1-12.
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::OutOfRange {
                field: "month".to_string(),
                min: "1".to_string(),
                max: "12".to_string(),
            });
        }
        Ok(MonthKey { year, month })
    }

    /// The month containing `instant`.
    pub fn of(instant: DateTime<Utc>) -> Self {
        MonthKey {
            year: instant.year(),
            month: instant.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following month.
    pub fn next(&self) -> Self {
        self.offset(1)
    }

    /// Shifts by `months` (negative goes back).
    pub fn offset(&self, months: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + months;
        MonthKey {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// First calendar day.
    pub fn start_date(&self) -> NaiveDate {
        // Month is always 1-12 and day 1 always exists.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last calendar day.
    pub fn end_date(&self) -> NaiveDate {
        self.next()
            .start_date()
            .pred_opt()
            .unwrap_or(NaiveDate::MIN)
    }

    /// Inclusive lower bound: first day at 00:00 UTC.
    pub fn start(&self) -> DateTime<Utc> {
        start_of_day(self.start_date())
    }

    /// Exclusive upper bound: first day of the next month at 00:00 UTC.
    pub fn end_exclusive(&self) -> DateTime<Utc> {
        self.next().start()
    }

    /// Last representable instant of the month, used as the as-of for
    /// period depreciation runs.
    pub fn end_instant(&self) -> DateTime<Utc> {
        self.end_exclusive() - Duration::milliseconds(1)
    }

    /// Whether `instant` falls inside `[start, end_exclusive)`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start() && instant < self.end_exclusive()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = ValidationError;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidFormat {
            field: "period".to_string(),
            reason: format!("'{}' is not a YYYY-MM month", s),
        };
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        MonthKey::new(year, month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_day_span() {
        assert_eq!(day_span(utc(2024, 1, 1), utc(2024, 12, 31)), dec!(365));
        assert_eq!(day_span(utc(2024, 1, 2), utc(2024, 1, 1)), dec!(-1));
        let half = utc(2024, 1, 1) + Duration::hours(12);
        assert_eq!(day_span(utc(2024, 1, 1), half), dec!(0.5));
    }

    #[test]
    fn test_months_owned() {
        let acquired = utc(2020, 1, 1);
        assert_eq!(months_owned(acquired, acquired), 0);
        assert_eq!(months_owned(acquired, acquired + Duration::days(30)), 0);
        assert_eq!(months_owned(acquired, acquired + Duration::days(31)), 1);
        assert_eq!(months_owned(acquired, acquired + Duration::days(914)), 30);
        assert_eq!(months_owned(acquired, utc(2019, 6, 1)), 0);
    }

    #[test]
    fn test_overlap_days() {
        let march = MonthKey::new(2024, 3).unwrap();
        let days = overlap_days(
            march.start(),
            march.end_exclusive(),
            utc(2024, 3, 16),
            utc(2024, 6, 1),
        );
        assert_eq!(days, dec!(16));

        let none = overlap_days(
            march.start(),
            march.end_exclusive(),
            utc(2024, 4, 1),
            utc(2024, 6, 1),
        );
        assert_eq!(none, Decimal::ZERO);
    }

    #[test]
    fn test_month_key_navigation() {
        let dec_2023 = MonthKey::new(2023, 12).unwrap();
        assert_eq!(dec_2023.next(), MonthKey::new(2024, 1).unwrap());
        assert_eq!(dec_2023.offset(-12), MonthKey::new(2022, 12).unwrap());
        assert_eq!(dec_2023.offset(-11), MonthKey::new(2023, 1).unwrap());

        let feb = MonthKey::new(2024, 2).unwrap();
        assert_eq!(feb.end_date(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(feb.contains(utc(2024, 2, 29)));
        assert!(!feb.contains(utc(2024, 3, 1)));
        assert!(feb.end_instant() < utc(2024, 3, 1));
    }

    #[test]
    fn test_month_key_parse_and_display() {
        let key: MonthKey = "2024-03".parse().unwrap();
        assert_eq!(key.to_string(), "2024-03");
        assert!("2024-13".parse::<MonthKey>().is_err());
        assert!("2024-3".parse::<MonthKey>().is_err());
        assert!("March".parse::<MonthKey>().is_err());

        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2024-03\"");
    }

    #[test]
    fn test_parse_instant() {
        assert_eq!(parse_instant("as_of", "2024-07-01").unwrap(), utc(2024, 7, 1));
        assert_eq!(
            parse_instant("as_of", "2024-07-01T12:00:00+02:00").unwrap(),
            utc(2024, 7, 1) + Duration::hours(10)
        );
        assert!(parse_instant("as_of", "07/01/2024").is_err());
    }
}
