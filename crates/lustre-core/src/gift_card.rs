//! # Gift Card Arithmetic
//!
//! Code format, expiry dates, spendability and balance math for gift cards.
//!
//! ## Card Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Gift Card Lifecycle                               │
//! │                                                                         │
//! │  GiftCard::issue(purchase, now)                                        │
//! │  ├── code       = generate_gift_card_code()     GIFT-7KQ2-M9XA-P4TD    │
//! │  ├── balance    = amount                                                │
//! │  ├── status     = active                                                │
//! │  └── expires_at = calculate_expiry_date(now)    now + 12 months         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  redeem_gift_card(card, total, now)                                    │
//! │  ├── can_use_gift_card?          (status, balance > 0, now < expiry)  │
//! │  ├── applied   = min(balance, total)                                   │
//! │  ├── remaining = max(0, balance - applied)                             │
//! │  └── status    = status_after_redemption(card, remaining)              │
//! │                                                                         │
//! │  The caller writes remaining + status back through the record store.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Months, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{DesignTheme, GiftCard, GiftCardStatus};
use crate::validation::{
    validate_email, validate_gift_card_amount, validate_message, validate_recipient_name,
};
use crate::{
    GIFT_CARD_CODE_PREFIX, GIFT_CARD_VALIDITY_MONTHS, MAX_GIFT_CARD_AMOUNT, MIN_GIFT_CARD_AMOUNT,
};

static GIFT_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^GIFT-[A-Z0-9]{4}-[A-Z0-9]{4}-[A-Z0-9]{4}$").expect("gift code pattern is valid")
});

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_GROUPS: usize = 3;
const CODE_GROUP_LEN: usize = 4;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

// =============================================================================
// Rejections
// =============================================================================

/// Why a gift card cannot be applied. Display is the shopper-facing sentence.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GiftCardRejection {
    #[error("Invalid gift card code format")]
    InvalidFormat,

    /// No record matches the normalized code.
    #[error("Invalid gift card code")]
    NotFound,

    #[error("This gift card has expired")]
    Expired,

    #[error("This gift card has no remaining balance")]
    NoRemainingBalance,

    /// Cancelled, or otherwise not in a spendable status.
    #[error("This gift card cannot be used")]
    NotRedeemable { status: GiftCardStatus },

    /// The record store could not be reached.
    #[error("Failed to validate gift card")]
    LookupFailed,
}

// =============================================================================
// Code Format
// =============================================================================

/// Returns true if `code` has the canonical `GIFT-XXXX-XXXX-XXXX` shape.
///
/// Case-sensitive: callers uppercase before checking.
///
/// ```rust
/// use lustre_core::gift_card::is_valid_gift_card_code_format;
///
/// assert!(is_valid_gift_card_code_format("GIFT-AB12-CD34-EF56"));
/// assert!(!is_valid_gift_card_code_format("gift-ab12-cd34-ef56"));
/// ```
pub fn is_valid_gift_card_code_format(code: &str) -> bool {
    GIFT_CODE_RE.is_match(code)
}

/// Generates a fresh random gift card code.
pub fn generate_gift_card_code() -> String {
    let mut rng = rand::thread_rng();
    let mut code = String::from(GIFT_CARD_CODE_PREFIX);

    for _ in 0..CODE_GROUPS {
        code.push('-');
        for _ in 0..CODE_GROUP_LEN {
            let idx = rng.gen_range(0..CODE_ALPHABET.len());
            code.push(CODE_ALPHABET[idx] as char);
        }
    }

    code
}

// =============================================================================
// Dates
// =============================================================================

/// Expiry of a card purchased at `purchased_at`.
///
/// Adds [`GIFT_CARD_VALIDITY_MONTHS`] calendar months. A day missing from the
/// target month clamps to its last day (29 Feb 2028 → 28 Feb 2029).
pub fn calculate_expiry_date(purchased_at: DateTime<Utc>) -> DateTime<Utc> {
    add_months(purchased_at, GIFT_CARD_VALIDITY_MONTHS)
}

/// Adds `months` calendar months, saturating at the end of representable time.
pub fn add_months(from: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    from.checked_add_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Whole days left before `expires_at`, rounded up. Negative once passed.
///
/// ```rust
/// use chrono::{Duration, TimeZone, Utc};
/// use lustre_core::gift_card::days_until_expiry;
///
/// let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
/// assert_eq!(days_until_expiry(now + Duration::hours(30), now), 2);
/// assert_eq!(days_until_expiry(now, now), 0);
/// ```
pub fn days_until_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (expires_at - now).num_milliseconds();
    (millis as f64 / MILLIS_PER_DAY).ceil() as i64
}

/// Returns true once `now` has reached `expires_at`.
pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= expires_at
}

/// Returns true if an unexpired date falls inside the warning window.
pub fn is_within_expiry_warning(
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
    warning_days: i64,
) -> bool {
    !is_expired(expires_at, now) && days_until_expiry(expires_at, now) <= warning_days
}

// =============================================================================
// Balance Math
// =============================================================================

/// Returns true iff the card is active or partially used, has a positive
/// balance, and has not expired.
pub fn can_use_gift_card(card: &GiftCard, now: DateTime<Utc>) -> bool {
    check_gift_card(card, now).is_ok()
}

/// Same rules as [`can_use_gift_card`], reporting the first failing one.
///
/// Order: expiry, remaining balance, status.
pub fn check_gift_card(card: &GiftCard, now: DateTime<Utc>) -> Result<(), GiftCardRejection> {
    if card.status == GiftCardStatus::Expired || is_expired(card.expires_at, now) {
        return Err(GiftCardRejection::Expired);
    }

    if !card.balance().is_positive() {
        return Err(GiftCardRejection::NoRemainingBalance);
    }

    if !card.status.is_redeemable() {
        return Err(GiftCardRejection::NotRedeemable {
            status: card.status,
        });
    }

    Ok(())
}

/// `min(balance, total)`.
pub fn calculate_gift_card_discount(card: &GiftCard, total: Money) -> Money {
    card.balance().min(total).non_negative()
}

/// `max(0, balance - used)`.
///
/// ```rust
/// # use chrono::Utc;
/// # use lustre_core::gift_card::calculate_remaining_balance;
/// # use lustre_core::money::Money;
/// # use lustre_core::types::*;
/// # let card = GiftCard {
/// #     id: "g".into(), code: "GIFT-AAAA-BBBB-CCCC".into(), amount: 500.0, balance: 300.0,
/// #     status: GiftCardStatus::PartiallyUsed, design_theme: DesignTheme::Classic,
/// #     purchased_at: Utc::now(), expires_at: Utc::now(), recipient_name: "Asha".into(),
/// #     recipient_email: "asha@example.com".into(), sender_name: None, personal_message: None,
/// # };
/// assert_eq!(calculate_remaining_balance(&card, Money::from_major_units(500)), Money::zero());
/// ```
pub fn calculate_remaining_balance(card: &GiftCard, used: Money) -> Money {
    (card.balance() - used).non_negative()
}

/// Status a card should carry once its balance is `remaining`.
///
/// - `0` → fully redeemed
/// - below face value → partially used
/// - otherwise unchanged
pub fn status_after_redemption(card: &GiftCard, remaining: Money) -> GiftCardStatus {
    if !remaining.is_positive() {
        GiftCardStatus::FullyRedeemed
    } else if remaining < card.face_value() {
        GiftCardStatus::PartiallyUsed
    } else {
        card.status
    }
}

/// Account balance actually applied at checkout: the smallest of the three.
pub fn calculate_balance_to_use(available: Money, requested: Money, order_total: Money) -> Money {
    available.min(requested).min(order_total).non_negative()
}

// =============================================================================
// Redemption
// =============================================================================

/// Outcome of applying a gift card to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GiftCardRedemption {
    pub gift_card_id: String,
    pub amount_applied: Money,
    pub remaining_balance: Money,
    pub new_status: GiftCardStatus,
}

/// Applies `card` to an order of `total`. Pure; nothing is written.
pub fn redeem_gift_card(
    card: &GiftCard,
    total: Money,
    now: DateTime<Utc>,
) -> Result<GiftCardRedemption, GiftCardRejection> {
    check_gift_card(card, now)?;

    let amount_applied = calculate_gift_card_discount(card, total);
    let remaining_balance = calculate_remaining_balance(card, amount_applied);

    Ok(GiftCardRedemption {
        gift_card_id: card.id.clone(),
        amount_applied,
        remaining_balance,
        new_status: status_after_redemption(card, remaining_balance),
    })
}

// =============================================================================
// Validation Result
// =============================================================================

/// Result handed back to the checkout page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GiftCardValidation {
    pub valid: bool,
    pub gift_card: Option<GiftCard>,
    pub discount_amount: Money,
    pub error: Option<String>,
}

impl GiftCardValidation {
    pub fn accepted(gift_card: GiftCard, discount_amount: Money) -> Self {
        GiftCardValidation {
            valid: true,
            gift_card: Some(gift_card),
            discount_amount,
            error: None,
        }
    }

    pub fn rejected(reason: GiftCardRejection) -> Self {
        GiftCardValidation {
            valid: false,
            gift_card: None,
            discount_amount: Money::zero(),
            error: Some(reason.to_string()),
        }
    }
}

/// Builds the checkout response for a looked-up card (or its absence).
pub fn validate_gift_card_record(
    card: Option<GiftCard>,
    total: Money,
    now: DateTime<Utc>,
) -> GiftCardValidation {
    let Some(card) = card else {
        return GiftCardValidation::rejected(GiftCardRejection::NotFound);
    };

    match check_gift_card(&card, now) {
        Ok(()) => {
            let discount = calculate_gift_card_discount(&card, total);
            GiftCardValidation::accepted(card, discount)
        }
        Err(reason) => GiftCardValidation::rejected(reason),
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// What a shopper fills in to buy a gift card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GiftCardPurchase {
    pub amount: Money,
    #[serde(default)]
    pub design_theme: DesignTheme,
    pub recipient_name: String,
    pub recipient_email: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub personal_message: Option<String>,
}

impl GiftCardPurchase {
    /// Collects every field error.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = validate_gift_card_amount(
            self.amount,
            Money::from_major_units(MIN_GIFT_CARD_AMOUNT),
            Money::from_major_units(MAX_GIFT_CARD_AMOUNT),
        );

        if let Err(err) = validate_recipient_name(&self.recipient_name) {
            errors.push(err);
        }
        if let Err(err) = validate_email(&self.recipient_email) {
            errors.push(err);
        }
        if let Some(message) = &self.personal_message {
            if let Err(err) = validate_message("Personal message", message) {
                errors.push(err);
            }
        }

        errors
    }
}

impl GiftCard {
    /// Issues a new card for a validated purchase.
    ///
    /// ## Errors
    /// The first field error from [`GiftCardPurchase::validate`].
    pub fn issue(purchase: GiftCardPurchase, now: DateTime<Utc>) -> Result<GiftCard, ValidationError> {
        if let Some(err) = purchase.validate().into_iter().next() {
            return Err(err);
        }

        let amount = purchase.amount.to_major();
        let personal_message = purchase
            .personal_message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        Ok(GiftCard {
            id: Uuid::new_v4().to_string(),
            code: generate_gift_card_code(),
            amount,
            balance: amount,
            status: GiftCardStatus::Active,
            design_theme: purchase.design_theme,
            purchased_at: now,
            expires_at: calculate_expiry_date(now),
            recipient_name: purchase.recipient_name.trim().to_string(),
            recipient_email: purchase.recipient_email.trim().to_string(),
            sender_name: purchase.sender_name.map(|s| s.trim().to_string()),
            personal_message,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
