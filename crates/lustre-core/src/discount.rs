//! # Discount Composer
//!
//! Combines the discounts a checkout has collected into one payable amount.
//!
//! ```text
//!   total ₹12,000
//!     ├── promo     ₹600
//!     ├── gift card ₹2,000
//!     └── bulk      ₹1,200     (12 cards ≥ 10)
//!                   ──────
//!   total_discount  ₹3,800  →  final_amount ₹8,200
//! ```
//!
//! Discounts are summed as given. Which discounts may be combined is up to
//! the caller; no precedence or exclusivity is applied here.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::promo::calculate_final_amount;
use crate::types::Percent;

/// Smallest bulk order that earns the wholesale discount.
pub const BULK_DISCOUNT_MIN_QUANTITY: usize = 10;

/// Wholesale discount rate (10%).
pub const BULK_DISCOUNT_RATE: Percent = Percent::from_bps(1_000);

/// Sum of discounts and the amount left to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountSummary {
    pub total_discount: Money,
    pub final_amount: Money,
}

/// Sums `discounts` and subtracts them from `total`, flooring at zero.
///
/// ```rust
/// use lustre_core::discount::apply_multiple_discounts;
/// use lustre_core::money::Money;
///
/// let rs = Money::from_major_units;
/// let summary = apply_multiple_discounts(rs(1_000), &[rs(700), rs(500)]);
/// assert_eq!(summary.total_discount, rs(1_200));
/// assert_eq!(summary.final_amount, Money::zero());
/// ```
pub fn apply_multiple_discounts(total: Money, discounts: &[Money]) -> DiscountSummary {
    let total_discount: Money = discounts.iter().sum();

    DiscountSummary {
        total_discount,
        final_amount: calculate_final_amount(total, total_discount),
    }
}

/// Returns true iff `quantity` reaches [`BULK_DISCOUNT_MIN_QUANTITY`].
pub fn qualifies_for_bulk_discount(quantity: usize) -> bool {
    quantity >= BULK_DISCOUNT_MIN_QUANTITY
}

/// Flat 10% of `total`, rounded to the paisa.
///
/// Does not check eligibility; pair it with [`qualifies_for_bulk_discount`].
pub fn calculate_bulk_discount(total: Money) -> Money {
    total.percentage(BULK_DISCOUNT_RATE)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_threshold() {
        assert!(!qualifies_for_bulk_discount(0));
        assert!(!qualifies_for_bulk_discount(9));
        assert!(qualifies_for_bulk_discount(10));
        assert!(qualifies_for_bulk_discount(12));
    }

    #[test]
    fn test_twelve_rows_of_1000() {
        let total = Money::from_major_units(12_000);
        assert!(qualifies_for_bulk_discount(12));
        assert_eq!(calculate_bulk_discount(total), Money::from_major_units(1_200));
    }

    #[test]
    fn test_bulk_discount_rounds_half_up() {
        // ₹10.05 * 10% = ₹1.005 → ₹1.01
        assert_eq!(calculate_bulk_discount(Money::from_paise(1005)), Money::from_paise(101));
    }

    #[test]
    fn test_bulk_discount_ignores_eligibility() {
        let total = Money::from_major_units(3_000);
        assert!(!qualifies_for_bulk_discount(3));
        assert_eq!(calculate_bulk_discount(total), Money::from_major_units(300));
    }

    #[test]
    fn test_no_discounts() {
        let total = Money::from_paise(99_950);
        let summary = apply_multiple_discounts(total, &[]);
        assert_eq!(summary.total_discount, Money::zero());
        assert_eq!(summary.final_amount, total);
    }

    #[test]
    fn test_discounts_are_summed_without_precedence() {
        let rs = Money::from_major_units;
        let summary = apply_multiple_discounts(rs(12_000), &[rs(600), rs(2_000), rs(1_200)]);
        assert_eq!(summary.total_discount, rs(3_800));
        assert_eq!(summary.final_amount, rs(8_200));
    }
}
