//! # Money Module
//!
//! Provides the `Money` type for handling Taka amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing a day of repair tickets in f64:                               │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ drift across aggregation         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer poisha (1 Taka = 100 poisha)                    │
//! │    Every ticket amount, salary split and report total is an i64.       │
//! │    Only the JSON boundary speaks in Taka.                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Clients send and receive plain JSON numbers in Taka (`150`, `12.5`).
//! Numeric strings (`"150"`) are accepted on input as well, matching the
//! forms staff tablets already submit.
//!
//! ## Usage
//! ```rust
//! use cpr_core::money::Money;
//!
//! let service = Money::from_major(100);       // 100 Tk
//! let part = Money::from_major_minor(15, 50); // 15.50 Tk
//! let total = service + part;
//! assert_eq!(total.minor(), 11550);
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Percentage;

/// Minor units per Taka.
const MINOR_PER_MAJOR: i64 = 100;

/// Largest amount, in Taka, accepted from a client or a stored document.
///
/// Millions of amounts at this bound still sum inside an i64 of poisha.
pub const MAX_WIRE_MAJOR: i64 = 10_000_000_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in poisha (the smallest Taka unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: net income and demurrage can push totals negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Custom serde**: Taka on the wire, poisha in memory
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Problem.amounts.baseAmount ──┬──► Summary.baseTotal                    │
/// │  Problem.guarantee.amount ────┼──► Summary.netTotal ──► staff earnings  │
/// │  Problem.extraPart.partCost ──┴──► Summary.totalPartsCost / partsIncome │
/// │                                                                         │
/// │  GuaranteeRecord.guarantee.amount ──► guaranteeTotal / demurrageTotal   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[ts(export)]
pub struct Money(#[ts(type = "number")] i64);

impl Money {
    /// Creates a Money value from poisha.
    ///
    /// ## Example
    /// ```rust
    /// use cpr_core::money::Money;
    ///
    /// let fee = Money::from_minor(1050); // 10.50 Tk
    /// assert_eq!(fee.minor(), 1050);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole Taka.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_PER_MAJOR)
    }

    /// Creates a Money value from Taka and poisha.
    ///
    /// ## Example
    /// ```rust
    /// use cpr_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 50).minor(), 1050);
    /// assert_eq!(Money::from_major_minor(-5, 50).minor(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * MINOR_PER_MAJOR - minor)
        } else {
            Money(major * MINOR_PER_MAJOR + minor)
        }
    }

    /// Returns the value in poisha.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the whole-Taka portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the poisha portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
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

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Applies a percentage and rounds the result to a whole Taka.
    ///
    /// ## Rounding
    /// Round-half-away-from-zero on the exact rational value, computed in
    /// integer arithmetic:
    /// ```text
    /// taka = round(poisha × bps / (10000 × 100))
    /// ```
    /// This is how a staff member's salary share is taken from their daily
    /// earnings: 1234 Tk at 12.5% = 154.25 → 154 Tk; 1005 Tk at 10% = 100.5
    /// → 101 Tk.
    ///
    /// ## Example
    /// ```rust
    /// use cpr_core::money::Money;
    /// use cpr_core::types::Percentage;
    ///
    /// let earnings = Money::from_major(1005);
    /// let salary = earnings.percentage_to_whole_major(Percentage::from_bps(1000));
    /// assert_eq!(salary, Money::from_major(101));
    /// ```
    pub fn percentage_to_whole_major(&self, rate: Percentage) -> Money {
        let numerator = self.0 as i128 * rate.bps() as i128;
        let denominator = 10_000i128 * MINOR_PER_MAJOR as i128;
        let whole = div_round_half_away(numerator, denominator);
        Money((whole * MINOR_PER_MAJOR as i128) as i64)
    }

    /// Converts a Taka amount expressed as f64 into Money.
    ///
    /// Only used at the JSON boundary; rounds to the nearest poisha.
    fn from_major_f64(value: f64) -> Option<Money> {
        if !value.is_finite() {
            return None;
        }
        if value.abs() > MAX_WIRE_MAJOR as f64 {
            return None;
        }
        Some(Money((value * MINOR_PER_MAJOR as f64).round() as i64))
    }
}

/// Integer division rounding half away from zero.
fn div_round_half_away(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder.abs() * 2 >= denominator.abs() {
        quotient + numerator.signum() * denominator.signum()
    } else {
        quotient
    }
}

// =============================================================================
// Serde (Taka on the wire)
// =============================================================================

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % MINOR_PER_MAJOR == 0 {
            serializer.serialize_i64(self.0 / MINOR_PER_MAJOR)
        } else {
            serializer.serialize_f64(self.0 as f64 / MINOR_PER_MAJOR as f64)
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an amount in Taka as a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        if !(-MAX_WIRE_MAJOR..=MAX_WIRE_MAJOR).contains(&v) {
            return Err(E::custom("amount out of range"));
        }
        Ok(Money::from_major(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        let v = i64::try_from(v).map_err(|_| E::custom("amount out of range"))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Money::from_major_f64(v).ok_or_else(|| E::custom("amount out of range"))
    }

    /// `null` counts as nothing charged.
    fn visit_unit<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::zero())
    }

    fn visit_none<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::zero())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Ok(Money::zero());
        }
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(Money::from_major_f64)
            .ok_or_else(|| E::custom(format!("invalid amount: {v:?}")))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation for logs and debugging.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Tk {}.{:02}", sign, self.major().abs(), self.minor_part())
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(Money::from_major(150).minor(), 15000);
        assert_eq!(Money::from_major_minor(10, 5).minor(), 1005);
        assert_eq!(Money::from_minor(-550).major(), -5);
        assert_eq!(Money::from_minor(-550).minor_part(), 50);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(1099).to_string(), "Tk 10.99");
        assert_eq!(Money::from_minor(-550).to_string(), "-Tk 5.50");
        assert_eq!(Money::zero().to_string(), "Tk 0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_major(100);
        let b = Money::from_major(20);
        assert_eq!((a + b).minor(), 12000);
        assert_eq!((a - b).minor(), 8000);
        assert_eq!((-a).minor(), -10000);

        let total: Money = vec![a, b, Money::from_minor(5)].into_iter().sum();
        assert_eq!(total.minor(), 12005);
    }

    #[test]
    fn test_serialize_as_taka() {
        assert_eq!(serde_json::to_string(&Money::from_major(150)).unwrap(), "150");
        assert_eq!(serde_json::to_string(&Money::from_minor(1250)).unwrap(), "12.5");
        assert_eq!(serde_json::to_string(&Money::from_minor(-1)).unwrap(), "-0.01");
    }

    #[test]
    fn test_deserialize_numbers_and_strings() {
        let m: Money = serde_json::from_str("150").unwrap();
        assert_eq!(m, Money::from_major(150));

        let m: Money = serde_json::from_str("99.99").unwrap();
        assert_eq!(m.minor(), 9999);

        let m: Money = serde_json::from_str("\"20\"").unwrap();
        assert_eq!(m, Money::from_major(20));

        let m: Money = serde_json::from_str("\"\"").unwrap();
        assert!(m.is_zero());

        assert!(serde_json::from_str::<Money>("\"abc\"").is_err());
        assert!(serde_json::from_str::<Money>("true").is_err());
    }

    #[test]
    fn test_null_is_zero() {
        let m: Money = serde_json::from_str("null").unwrap();
        assert!(m.is_zero());

        let m: Money = serde_json::from_value(serde_json::Value::Null).unwrap();
        assert!(m.is_zero());
    }

    #[test]
    fn test_amounts_beyond_the_wire_bound_are_rejected() {
        let edge: Money = serde_json::from_value(serde_json::json!(MAX_WIRE_MAJOR)).unwrap();
        assert_eq!(edge, Money::from_major(MAX_WIRE_MAJOR));

        for raw in [
            serde_json::json!(90_000_000_000_000_000i64),
            serde_json::json!(u64::MAX),
            serde_json::json!(i64::MIN),
            serde_json::json!(-1e17),
            serde_json::json!("90000000000000000"),
        ] {
            assert!(serde_json::from_value::<Money>(raw).is_err());
        }
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Money::from_minor(i64::MAX);
        let min = Money::from_minor(i64::MIN);
        assert_eq!(max + max, max);
        assert_eq!(min - max, min);
        assert_eq!(-min, max);

        let mut acc = max;
        acc += Money::from_major(1);
        assert_eq!(acc, max);
        let total: Money = [max, max, max].iter().sum();
        assert_eq!(total, max);
    }

    #[test]
    fn test_percentage_rounds_half_away_from_zero() {
        // 1005 * 10% = 100.5 -> 101
        let salary = Money::from_major(1005).percentage_to_whole_major(Percentage::from_bps(1000));
        assert_eq!(salary, Money::from_major(101));

        // 1234 * 12.5% = 154.25 -> 154
        let salary = Money::from_major(1234).percentage_to_whole_major(Percentage::from_bps(1250));
        assert_eq!(salary, Money::from_major(154));

        // -1005 * 10% = -100.5 -> -101
        let salary = Money::from_major(-1005).percentage_to_whole_major(Percentage::from_bps(1000));
        assert_eq!(salary, Money::from_major(-101));

        // 0% always zero
        let salary = Money::from_major(999).percentage_to_whole_major(Percentage::zero());
        assert!(salary.is_zero());
    }

    #[test]
    fn test_percentage_of_fractional_earnings() {
        // 10.50 Tk at 50% = 5.25 -> 5
        let salary = Money::from_minor(1050).percentage_to_whole_major(Percentage::from_bps(5000));
        assert_eq!(salary, Money::from_major(5));
    }
}
