//! # Money Module
//!
//! Provides the `Money` type for monetary values in the finance engine.
//!
//! ## Where Rounding Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FORMULAS RUN IN DECIMAL, RESULTS LAND IN CENTS                         │
//! │                                                                         │
//! │  $12,000.00 over 365 days, 182 days elapsed:                           │
//! │    12000 / 365 × 182 = 5983.5616438356...   (Decimal, exact digits)    │
//! │                                                                         │
//! │  Money::from_decimal(..)                                                │
//! │    → 598356 cents = $5,983.56   (half away from zero)                  │
//! │                                                                         │
//! │  Every value that leaves a calculator is whole cents.                  │
//! │  Sums of Money never drift, so ledger identities hold exactly.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use atlvs_core::money::Money;
//! use rust_decimal_macros::dec;
//!
//! let cost = Money::from_cents(1_200_000); // $12,000.00
//! let salvage = Money::from_major_minor(2_000, 0);
//! assert_eq!((cost - salvage).cents(), 1_000_000);
//!
//! let expected = Money::from_decimal(dec!(5983.5616));
//! assert_eq!(expected.cents(), 598_356);
//! ```
//!
//! ## Wire Format
//! On the JSON boundary Money is a plain number in major units (`5983.56`),
//! matching what the finance pages already render. Internally and in the
//! database it is always integer cents.
//!
//! ## Range
//! Amounts entering the engine are limited to [`MAX_AMOUNT`] in magnitude
//! ($1 trillion). Deserialization and the amount validators reject anything
//! larger, which keeps every calculator product and every portfolio sum far
//! inside `i64` cents.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Largest magnitude accepted for an input amount: $1,000,000,000,000.00.
pub const MAX_AMOUNT: Money = Money(100_000_000_000_000);

/// Represents a monetary value in cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: disposal gain/loss and waterfall balances can be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serialized as a number in major units** (see module docs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[ts(export)]
pub struct Money(#[ts(type = "number")] i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use atlvs_core::money::Money;
    ///
    /// let cost = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(cost.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// ## Example
    /// ```rust
    /// use atlvs_core::money::Money;
    ///
    /// let loss = Money::from_major_minor(-5, 50); // -$5.50
    /// assert_eq!(loss.cents(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Rounds a Decimal amount in major units to whole cents, half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use atlvs_core::money::Money;
    /// use rust_decimal_macros::dec;
    ///
    /// assert_eq!(Money::from_decimal(dec!(0.125)).cents(), 13);
    /// assert_eq!(Money::from_decimal(dec!(-0.125)).cents(), -13);
    /// ```
    ///
    /// For calculator results, whose inputs are already bounded by
    /// [`MAX_AMOUNT`]. Untrusted amounts go through [`Money::try_from_decimal`].
    pub fn from_decimal(amount: Decimal) -> Self {
        Money::try_from_decimal(amount).unwrap_or(if amount.is_sign_negative() {
            Money(i64::MIN)
        } else {
            Money(i64::MAX)
        })
    }

    /// Rounds like [`Money::from_decimal`]; `None` when the result does not
    /// fit in `i64` cents.
    ///
    /// ## Example
    /// ```rust
    /// use atlvs_core::money::Money;
    /// use rust_decimal_macros::dec;
    ///
    /// assert_eq!(Money::try_from_decimal(dec!(19.99)), Some(Money::from_cents(1999)));
    /// assert_eq!(Money::try_from_decimal(dec!(100000000000000000000)), None);
    /// ```
    pub fn try_from_decimal(amount: Decimal) -> Option<Self> {
        amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|c| c.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|c| c.to_i64())
            .map(Money)
    }

    /// Whether the magnitude is within [`MAX_AMOUNT`].
    #[inline]
    pub const fn is_within_limit(&self) -> bool {
        self.0 >= -MAX_AMOUNT.0 && self.0 <= MAX_AMOUNT.0
    }

    /// `None` on `i64` overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `None` on `i64` overflow.
    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sums without overflowing; `None` if any partial sum leaves `i64` cents.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(values: I) -> Option<Money> {
        values
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Returns the value as a Decimal in major units (`598356` → `5983.56`).
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Applies a percentage (0-100) and rounds to cents.
    ///
    /// Used for milestone amounts: `total × percentage / 100`.
    ///
    /// ## Example
    /// ```rust
    /// use atlvs_core::money::Money;
    /// use rust_decimal_macros::dec;
    ///
    /// let total = Money::from_cents(1_000_000); // $10,000.00
    /// assert_eq!(total.percent(dec!(33.333)).cents(), 333_330);
    /// ```
    pub fn percent(&self, percentage: Decimal) -> Money {
        Money::from_decimal(self.to_decimal() * percentage / Decimal::ONE_HUNDRED)
    }

    /// Share of `whole` this value represents, as a percentage with 2 decimal places.
    ///
    /// Returns zero when `whole` is zero.
    pub fn percent_of(&self, whole: Money) -> Decimal {
        if whole.is_zero() {
            return Decimal::ZERO;
        }
        (Decimal::from(self.0) * Decimal::ONE_HUNDRED / Decimal::from(whole.0))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Value in major units as a float, for the JSON boundary only.
    fn to_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money as `$1234.56` (no grouping). Used in error messages
/// and logs; the frontend formats for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Serde
// =============================================================================

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

/// Accepts JSON numbers (`1500`, `1500.5`) and numeric strings (`"1500.50"`).
/// More than two decimal places are rounded half away from zero. Amounts
/// beyond [`MAX_AMOUNT`] are rejected.
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl<'de> Visitor<'de> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a monetary amount in major units")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                bounded(v.checked_mul(100).map(Money))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                let v = i64::try_from(v).map_err(|_| E::custom("amount out of range"))?;
                self.visit_i64(v)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
                let amount = Decimal::from_f64(v)
                    .ok_or_else(|| E::custom("amount is not a finite number"))?;
                bounded(Money::try_from_decimal(amount))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                let amount = Decimal::from_str(v.trim())
                    .map_err(|e| E::custom(format!("invalid amount '{}': {}", v, e)))?;
                bounded(Money::try_from_decimal(amount))
            }
        }

        fn bounded<E: de::Error>(money: Option<Money>) -> Result<Money, E> {
            money
                .filter(Money::is_within_limit)
                .ok_or_else(|| E::custom(format!("amount out of range (max {})", MAX_AMOUNT)))
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_from_decimal_rounds_half_away_from_zero() {
        assert_eq!(Money::from_decimal(dec!(10.005)).cents(), 1001);
        assert_eq!(Money::from_decimal(dec!(10.004999)).cents(), 1000);
        assert_eq!(Money::from_decimal(dec!(-10.005)).cents(), -1001);
        assert_eq!(Money::from_decimal(dec!(5983.5616438356)).cents(), 598_356);
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(Money::from_cents(598_356).to_decimal(), dec!(5983.56));
        assert_eq!(Money::from_cents(-1).to_decimal(), dec!(-0.01));
    }

    #[test]
    fn test_percent_and_percent_of() {
        let total = Money::from_cents(1_200_000);
        assert_eq!(total.percent(dec!(25)).cents(), 300_000);

        let recognized = Money::from_cents(400_000);
        assert_eq!(recognized.percent_of(total), dec!(33.33));
        assert_eq!(recognized.percent_of(Money::zero()), Decimal::ZERO);
    }

    #[test]
    fn test_sum_and_neg() {
        let values = vec![Money::from_cents(100), Money::from_cents(250)];
        let total: Money = values.iter().sum();
        assert_eq!(total.cents(), 350);
        assert_eq!((-total).cents(), -350);
    }

    #[test]
    fn test_serialize_as_major_units() {
        let json = serde_json::to_string(&Money::from_cents(598_356)).unwrap();
        assert_eq!(json, "5983.56");

        let json = serde_json::to_string(&Money::from_cents(-250)).unwrap();
        assert_eq!(json, "-2.5");
    }

    #[test]
    fn test_deserialize_numbers_and_strings() {
        let m: Money = serde_json::from_str("12000").unwrap();
        assert_eq!(m.cents(), 1_200_000);

        let m: Money = serde_json::from_str("19.99").unwrap();
        assert_eq!(m.cents(), 1999);

        let m: Money = serde_json::from_str("\"1500.50\"").unwrap();
        assert_eq!(m.cents(), 150_050);

        assert!(serde_json::from_str::<Money>("\"abc\"").is_err());
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        let err = serde_json::from_str::<Money>("1e17").unwrap_err();
        assert!(err.to_string().contains("out of range"));

        assert!(serde_json::from_str::<Money>("100000000000000").is_err());
        assert!(serde_json::from_str::<Money>("-1000000000000.01").is_err());
        assert!(serde_json::from_str::<Money>("\"99999999999999999999\"").is_err());
        assert!(serde_json::from_str::<Money>("18446744073709551615").is_err());

        let max: Money = serde_json::from_str("1000000000000").unwrap();
        assert_eq!(max, MAX_AMOUNT);
    }

    #[test]
    fn test_checked_arithmetic() {
        let big = Money::from_cents(i64::MAX - 10);
        assert_eq!(big.checked_add(Money::from_cents(10)), Some(Money::from_cents(i64::MAX)));
        assert_eq!(big.checked_add(Money::from_cents(11)), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);

        assert_eq!(
            Money::checked_sum(vec![Money::from_cents(100), Money::from_cents(250)]),
            Some(Money::from_cents(350))
        );
        assert_eq!(Money::checked_sum(vec![big, big]), None);
    }

    #[test]
    fn test_max_amount_sums_stay_in_range() {
        // Ten thousand maximal amounts still fit comfortably.
        let total = Money::checked_sum(std::iter::repeat(MAX_AMOUNT).take(10_000));
        assert_eq!(total, Some(Money::from_cents(MAX_AMOUNT.cents() * 10_000)));
        assert!(MAX_AMOUNT.is_within_limit());
        assert!(!(MAX_AMOUNT + Money::from_cents(1)).is_within_limit());
    }
}
