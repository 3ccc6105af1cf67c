//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The hosted tables hand us amounts as JSON numbers:                     │
//! │    2000 * 12.5 / 100  = 250           fine                              │
//! │    0.1 + 0.2          = 0.30000000000000004                             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    Amounts are converted ONCE at the record boundary with              │
//! │    round-half-up on x * 100, then every rule works on i64 paise.        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lustre_core::money::{round_money, Money};
//!
//! let price = Money::from_major_units(2_000);      // ₹2,000
//! let fee = Money::from_major(12.125);              // ₹12.13 (half-up)
//! assert_eq!((price + fee).paise(), 201_213);
//! assert_eq!(round_money(0.1 + 0.2), 0.3);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Percent;

/// Display symbol for every amount the storefront shows.
pub const CURRENCY_SYMBOL: &str = "₹";

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in paise (1/100 rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: subtraction results can dip below zero before clamping
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serde**: serializes as the raw paise count
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  PromoCode.min_purchase_amount ──► minimum-purchase check               │
/// │  PromoCode.discount_value ───────► fixed discount                       │
/// │  GiftCard.balance ───────────────► gift card discount, remaining        │
/// │  BulkOrderCsvRow.amount ─────────► bulk quote ──► bulk discount         │
/// │                                                                         │
/// │  Every discount and payable amount is a Money                           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    ///
    /// ```rust
    /// use lustre_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(1099).paise(), 1099); // ₹10.99
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Largest whole-rupee amount that fits in paise.
    pub const MAX_MAJOR_UNITS: i64 = i64::MAX / 100;

    /// Creates a Money value from whole rupees, saturating at the i64 bounds.
    #[inline]
    pub const fn from_major_units(rupees: i64) -> Self {
        Money(rupees.saturating_mul(100))
    }

    /// Converts a decimal rupee amount (as stored by the hosted tables).
    ///
    /// Rounds half-up on `x * 100`, the same rule as [`round_money`].
    /// Non-finite input converts to zero.
    pub fn from_major(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        Money((amount * 100.0 + 0.5).floor() as i64)
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the amount as decimal rupees, for JSON responses.
    #[inline]
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / 100.0
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

    /// Clamps negative values to zero.
    ///
    /// ```rust
    /// use lustre_core::money::Money;
    ///
    /// let over_discounted = Money::from_paise(300) - Money::from_paise(500);
    /// assert_eq!(over_discounted.non_negative(), Money::zero());
    /// ```
    #[inline]
    pub fn non_negative(self) -> Self {
        self.max(Money::zero())
    }

    /// Returns true if the amount is a whole multiple of `step` rupees.
    pub const fn is_multiple_of_rupees(&self, step: i64) -> bool {
        step != 0 && self.0 % (step * 100) == 0
    }

    /// Calculates a percentage of this amount, rounding half-up to the paisa.
    ///
    /// ## Implementation
    /// Integer math: `(paise * bps + 5000) / 10000`.
    /// The +5000 provides the half-up rounding (5000/10000 = 0.5).
    ///
    /// ```rust
    /// use lustre_core::money::Money;
    /// use lustre_core::types::Percent;
    ///
    /// let total = Money::from_major_units(2_000);
    /// let five = Percent::from_percentage(5.0);
    /// assert_eq!(total.percentage(five), Money::from_major_units(100));
    /// ```
    pub fn percentage(&self, rate: Percent) -> Money {
        // i128 keeps large totals at high rates from overflowing
        let paise = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_paise(paise as i64)
    }

    /// Takes `pct` percent of this amount, rounding once to the paisa.
    ///
    /// Unlike [`Money::percentage`] the rate keeps every decimal it was
    /// stored with. Negative and non-finite rates give zero.
    ///
    /// ```rust
    /// use lustre_core::money::Money;
    ///
    /// let total = Money::from_major_units(10_000);
    /// assert_eq!(total.percent_of(33.333), Money::from_paise(333_330));
    /// ```
    pub fn percent_of(&self, pct: f64) -> Money {
        if !pct.is_finite() || pct <= 0.0 {
            return Money::zero();
        }
        Money::from_major(self.to_major() * pct / 100.0)
    }
}

// =============================================================================
// Free Functions
// =============================================================================

/// Rounds a decimal amount to 2 places using round-half-up on `x * 100`.
///
/// ```rust
/// use lustre_core::money::round_money;
///
/// assert_eq!(round_money(10.125), 10.13);
/// assert_eq!(round_money(99.994), 99.99);
/// ```
pub fn round_money(amount: f64) -> f64 {
    Money::from_major(amount).to_major()
}

/// Formats an amount for display.
///
/// Digits are grouped in threes and paise are shown only when non-zero.
///
/// ```rust
/// use lustre_core::money::{format_currency, Money};
///
/// assert_eq!(format_currency(Money::from_major_units(1_000)), "₹1,000");
/// assert_eq!(format_currency(Money::from_paise(12_345_675)), "₹123,456.75");
/// ```
pub fn format_currency(amount: Money) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    let digits = amount.rupees().abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match amount.paise_part() {
        0 => format!("{sign}{CURRENCY_SYMBOL}{grouped}"),
        paise => format!("{sign}{CURRENCY_SYMBOL}{grouped}.{paise:02}"),
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_currency(*self))
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

/// Multiplication by a quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
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
    fn test_from_paise() {
        let money = Money::from_paise(1099);
        assert_eq!(money.paise(), 1099);
        assert_eq!(money.rupees(), 10);
        assert_eq!(money.paise_part(), 99);
    }

    #[test]
    fn test_from_major_rounds_half_up() {
        assert_eq!(Money::from_major(10.125).paise(), 1013);
        assert_eq!(Money::from_major(10.124).paise(), 1012);
        assert_eq!(Money::from_major(2000.0).paise(), 200_000);
        assert_eq!(Money::from_major(f64::NAN), Money::zero());
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(0.1 + 0.2), 0.3);
        assert_eq!(round_money(1234.5678), 1234.57);
        assert_eq!(round_money(100.0), 100.0);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Money::zero()), "₹0");
        assert_eq!(format_currency(Money::from_major_units(999)), "₹999");
        assert_eq!(format_currency(Money::from_major_units(50_000)), "₹50,000");
        assert_eq!(format_currency(Money::from_major_units(1_234_567)), "₹1,234,567");
        assert_eq!(format_currency(Money::from_paise(150)), "₹1.50");
        assert_eq!(format_currency(Money::from_paise(-550)), "-₹5.50");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_paise(1000);
        let b = Money::from_paise(500);

        assert_eq!((a + b).paise(), 1500);
        assert_eq!((a - b).paise(), 500);
        assert_eq!((a * 3).paise(), 3000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.paise(), 2000);
    }

    #[test]
    fn test_percentage_rounding() {
        // ₹10.00 at 8.25% = ₹0.825 → ₹0.83
        let amount = Money::from_paise(1000);
        assert_eq!(amount.percentage(Percent::from_bps(825)).paise(), 83);

        // percentages above 100 are not clamped
        let over = Money::from_major_units(100).percentage(Percent::from_percentage(150.0));
        assert_eq!(over, Money::from_major_units(150));
    }

    #[test]
    fn test_from_major_units_saturates() {
        let largest = Money::from_major_units(Money::MAX_MAJOR_UNITS);
        assert_eq!(largest.rupees(), Money::MAX_MAJOR_UNITS);
        assert_eq!(Money::from_major_units(i64::MAX).paise(), i64::MAX);
        assert_eq!(Money::from_major_units(i64::MIN).paise(), i64::MIN);
    }

    #[test]
    fn test_percent_of_keeps_fractional_rates() {
        let total = Money::from_major_units(10_000);
        assert_eq!(total.percent_of(33.333), Money::from_paise(333_330));
        assert_eq!(total.percent_of(2.5), Money::from_major_units(250));
        assert_eq!(total.percent_of(-1.0), Money::zero());
        assert_eq!(total.percent_of(f64::NAN), Money::zero());
    }

    #[test]
    fn test_multiple_of_rupees() {
        assert!(Money::from_major_units(1000).is_multiple_of_rupees(100));
        assert!(!Money::from_major_units(950).is_multiple_of_rupees(100));
        assert!(!Money::from_paise(100_050).is_multiple_of_rupees(100));
        assert!(!Money::from_major_units(1000).is_multiple_of_rupees(0));
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(Money::from_paise(-1).non_negative(), Money::zero());
        assert_eq!(Money::from_paise(42).non_negative(), Money::from_paise(42));
    }
}
