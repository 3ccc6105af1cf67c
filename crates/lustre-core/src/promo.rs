//! # Promo Code Rules
//!
//! Decides whether a promo code applies to an order total and how much it
//! takes off.
//!
//! ## Evaluation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Promo Code Evaluation                                │
//! │                                                                         │
//! │  code "gift5", total ₹2,000                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  normalize_code → "GIFT5" → record store lookup (active only)          │
//! │       │                                                                 │
//! │       ├── no record / error?  → "Invalid promo code"                   │
//! │       ├── expires_at < now?   → "This promo code has expired"          │
//! │       ├── uses >= max_uses?   → "...reached its usage limit"           │
//! │       ├── total < minimum?    → "Minimum purchase amount of ₹… required"│
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  calculate_promo_discount → ₹100                                       │
//! │                                                                         │
//! │  The first failing check wins. Validation never touches current_uses.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{DiscountType, PromoCode};

// =============================================================================
// Rejections
// =============================================================================

/// Why a promo code was not applied. Display is the shopper-facing sentence.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PromoCodeRejection {
    /// No active record matches the normalized code.
    #[error("Invalid promo code")]
    NotFound,

    #[error("This promo code has expired")]
    Expired,

    #[error("This promo code has reached its usage limit")]
    UsageLimitReached,

    #[error("Minimum purchase amount of {min} required")]
    MinimumPurchaseNotMet { min: Money },
}

// =============================================================================
// Validation Result
// =============================================================================

/// Result handed back to the checkout page.
///
/// ```json
/// { "valid": true, "promo_code": { ... }, "discount_amount": 10000, "error": null }
/// { "valid": false, "promo_code": null, "discount_amount": 0, "error": "Invalid promo code" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PromoCodeValidation {
    pub valid: bool,
    pub promo_code: Option<PromoCode>,
    pub discount_amount: Money,
    pub error: Option<String>,
}

impl PromoCodeValidation {
    /// A successful validation carrying the matched record.
    pub fn accepted(promo_code: PromoCode, discount_amount: Money) -> Self {
        PromoCodeValidation {
            valid: true,
            promo_code: Some(promo_code),
            discount_amount,
            error: None,
        }
    }

    /// A failed validation carrying the user-facing reason.
    pub fn rejected(reason: PromoCodeRejection) -> Self {
        PromoCodeValidation {
            valid: false,
            promo_code: None,
            discount_amount: Money::zero(),
            error: Some(reason.to_string()),
        }
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Canonical form of a code as typed by a shopper: trimmed, uppercase.
///
/// ```rust
/// use lustre_core::promo::normalize_code;
///
/// assert_eq!(normalize_code("  gift5 "), "GIFT5");
/// ```
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Computes the discount a promo code grants on `total`.
///
/// - Percentage: `round2(total * value / 100)`. Values above 100% are NOT
///   clamped, so the discount can exceed the total; the final amount is still
///   floored at zero by [`calculate_final_amount`].
/// - Fixed: `min(value, total)`.
pub fn calculate_promo_discount(promo: &PromoCode, total: Money) -> Money {
    match promo.discount_type {
        DiscountType::Percentage => total.percent_of(promo.discount_value),
        DiscountType::Fixed => Money::from_major(promo.discount_value)
            .non_negative()
            .min(total),
    }
}

/// Runs every promo code check in order and returns the discount.
///
/// ## Errors
/// The first failing check, see the module diagram.
pub fn evaluate_promo_code(
    promo: &PromoCode,
    total: Money,
    now: DateTime<Utc>,
) -> Result<Money, PromoCodeRejection> {
    if !promo.is_active {
        return Err(PromoCodeRejection::NotFound);
    }

    if promo.is_expired_at(now) {
        return Err(PromoCodeRejection::Expired);
    }

    if promo.is_usage_exhausted() {
        return Err(PromoCodeRejection::UsageLimitReached);
    }

    let min = promo.min_purchase();
    if total < min {
        return Err(PromoCodeRejection::MinimumPurchaseNotMet { min });
    }

    Ok(calculate_promo_discount(promo, total))
}

/// Builds the checkout response for a looked-up record (or its absence).
pub fn validate_promo_record(
    promo: Option<PromoCode>,
    total: Money,
    now: DateTime<Utc>,
) -> PromoCodeValidation {
    let Some(promo) = promo else {
        return PromoCodeValidation::rejected(PromoCodeRejection::NotFound);
    };

    match evaluate_promo_code(&promo, total, now) {
        Ok(discount) => PromoCodeValidation::accepted(promo, discount),
        Err(reason) => PromoCodeValidation::rejected(reason),
    }
}

/// Amount payable after a discount. Never negative.
///
/// ```rust
/// use lustre_core::money::Money;
/// use lustre_core::promo::calculate_final_amount;
///
/// let total = Money::from_major_units(300);
/// assert_eq!(calculate_final_amount(total, Money::from_major_units(500)), Money::zero());
/// ```
pub fn calculate_final_amount(total: Money, discount: Money) -> Money {
    (total - discount).non_negative()
}

// =============================================================================
// Unit Tests
// =============================================================================
