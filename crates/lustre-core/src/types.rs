//! # Domain Types
//!
//! Records read from the hosted store, plus the small value types the rules
//! are written against.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────────┐                      │
//! │  │    PromoCode        │   │     GiftCard        │                      │
//! │  │  ─────────────────  │   │  ─────────────────  │                      │
//! │  │  code (uppercase)   │   │  code GIFT-XXXX-..  │                      │
//! │  │  discount_type      │   │  amount / balance   │                      │
//! │  │  discount_value     │   │  status             │                      │
//! │  │  min_purchase       │   │  design_theme       │                      │
//! │  │  max/current_uses   │   │  expires_at         │                      │
//! │  └─────────────────────┘   └─────────────────────┘                      │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────────┐   ┌──────────────┐  │
//! │  │    DiscountType     │   │   GiftCardStatus    │   │  Percent     │  │
//! │  │  Percentage         │   │  Active             │   │  bps (u32)   │  │
//! │  │  Fixed              │   │  PartiallyUsed      │   │  500 = 5%    │  │
//! │  └─────────────────────┘   │  FullyRedeemed      │   └──────────────┘  │
//! │                            │  Expired, Cancelled │                      │
//! │                            └─────────────────────┘                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Record Amounts
//! Records mirror the hosted tables: amounts arrive as decimal rupees
//! (`f64`). Accessors such as [`GiftCard::balance`] convert them into
//! [`Money`] once, and the rules never touch the raw `f64` again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Percent
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 500 bps = 5%, 10000 bps = 100%.
/// Values above 100% are representable on purpose; see
/// [`crate::promo::calculate_promo_discount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percent(u32);

impl Percent {
    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percent(bps)
    }

    /// Creates a percentage from a decimal percent value (5.0 = 5%).
    ///
    /// Negative and non-finite values become zero.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return Percent(0);
        }
        Percent((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Promo Code
// =============================================================================

/// How a promo code's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` is a percent of the order total.
    Percentage,
    /// `discount_value` is a rupee amount.
    Fixed,
}

/// A discount code shared with customers.
///
/// Read-only to the core; usage counts are incremented by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PromoCode {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Canonical uppercase code, e.g. `GIFT5`.
    pub code: String,

    pub discount_type: DiscountType,

    /// Percent (for `Percentage`) or rupees (for `Fixed`).
    pub discount_value: f64,

    /// Order total required before the code applies, in rupees.
    #[serde(default)]
    pub min_purchase_amount: f64,

    /// `None` means unlimited.
    #[serde(default)]
    pub max_uses: Option<i64>,

    #[serde(default)]
    pub current_uses: i64,

    pub is_active: bool,

    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PromoCode {
    /// Returns the minimum purchase amount as Money.
    #[inline]
    pub fn min_purchase(&self) -> Money {
        Money::from_major(self.min_purchase_amount)
    }

    /// Returns true once `current_uses` has reached `max_uses`.
    pub fn is_usage_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.current_uses >= max)
    }

    /// Returns true if the code expired strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

// =============================================================================
// Gift Card Status
// =============================================================================

/// Lifecycle status of a gift card.
///
/// ## Transitions
/// ```text
///   purchase ──► Active ──(partial use)──► PartiallyUsed ──(rest)──► FullyRedeemed
///                  │                            │
///                  └──────(expires_at)──────────┴──► Expired
///
///   Cancelled can be set by an administrator from any state.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum GiftCardStatus {
    #[default]
    Active,
    PartiallyUsed,
    FullyRedeemed,
    Expired,
    Cancelled,
}

impl GiftCardStatus {
    /// Returns true for the statuses a card can still be spent from.
    pub fn is_redeemable(&self) -> bool {
        matches!(self, GiftCardStatus::Active | GiftCardStatus::PartiallyUsed)
    }

    /// Returns the status string stored in the hosted table.
    pub fn as_str(&self) -> &'static str {
        match self {
            GiftCardStatus::Active => "active",
            GiftCardStatus::PartiallyUsed => "partially_used",
            GiftCardStatus::FullyRedeemed => "fully_redeemed",
            GiftCardStatus::Expired => "expired",
            GiftCardStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for GiftCardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Design Theme
// =============================================================================

/// Artwork printed on a gift card. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DesignTheme {
    Classic,
    Birthday,
    Anniversary,
    Wedding,
    Festive,
    ThankYou,
}

impl DesignTheme {
    /// Every theme, in the order the storefront lists them.
    pub const ALL: [DesignTheme; 6] = [
        DesignTheme::Classic,
        DesignTheme::Birthday,
        DesignTheme::Anniversary,
        DesignTheme::Wedding,
        DesignTheme::Festive,
        DesignTheme::ThankYou,
    ];

    /// Returns the identifier used in tables and CSV files.
    pub fn as_str(&self) -> &'static str {
        match self {
            DesignTheme::Classic => "classic",
            DesignTheme::Birthday => "birthday",
            DesignTheme::Anniversary => "anniversary",
            DesignTheme::Wedding => "wedding",
            DesignTheme::Festive => "festive",
            DesignTheme::ThankYou => "thank_you",
        }
    }

    /// Returns every identifier, for error messages.
    pub fn identifiers() -> Vec<String> {
        Self::ALL.iter().map(|t| t.as_str().to_string()).collect()
    }
}

impl Default for DesignTheme {
    fn default() -> Self {
        DesignTheme::Classic
    }
}

impl fmt::Display for DesignTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DesignTheme {
    type Err = ValidationError;

    /// Parses an identifier, ignoring surrounding whitespace and case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        DesignTheme::ALL
            .into_iter()
            .find(|theme| theme.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "Design theme".to_string(),
                allowed: DesignTheme::identifiers(),
            })
    }
}

// =============================================================================
// Gift Card
// =============================================================================

/// A prepaid, balance-bearing gift card.
///
/// ## Invariants
/// - `0 <= balance <= amount`
/// - `amount` is a multiple of ₹100 within the configured bounds
/// - `expires_at = purchased_at + GIFT_CARD_VALIDITY_MONTHS`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GiftCard {
    pub id: String,

    /// `GIFT-XXXX-XXXX-XXXX`, uppercase alphanumeric groups.
    pub code: String,

    /// Original face value, in rupees.
    pub amount: f64,

    /// Remaining redeemable value, in rupees.
    pub balance: f64,

    #[serde(default)]
    pub status: GiftCardStatus,

    #[serde(default)]
    pub design_theme: DesignTheme,

    #[ts(as = "String")]
    pub purchased_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,

    pub recipient_name: String,
    pub recipient_email: String,

    #[serde(default)]
    pub sender_name: Option<String>,

    #[serde(default)]
    pub personal_message: Option<String>,
}

impl GiftCard {
    /// Returns the face value as Money.
    #[inline]
    pub fn face_value(&self) -> Money {
        Money::from_major(self.amount)
    }

    /// Returns the remaining balance as Money.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_major(self.balance)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn promo() -> PromoCode {
        PromoCode {
            id: "p-1".to_string(),
            code: "GIFT5".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 5.0,
            min_purchase_amount: 1000.0,
            max_uses: Some(10),
            current_uses: 3,
            is_active: true,
            expires_at: None,
        }
    }

    #[test]
    fn test_percent_from_percentage() {
        assert_eq!(Percent::from_percentage(8.25).bps(), 825);
        assert_eq!(Percent::from_percentage(150.0).bps(), 15_000);
        assert_eq!(Percent::from_percentage(-5.0).bps(), 0);
        assert!((Percent::from_bps(1250).percentage() - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_promo_usage_exhausted() {
        let mut code = promo();
        assert!(!code.is_usage_exhausted());

        code.current_uses = 10;
        assert!(code.is_usage_exhausted());

        code.max_uses = None;
        assert!(!code.is_usage_exhausted());
    }

    #[test]
    fn test_promo_expiry_is_strict() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut code = promo();

        code.expires_at = Some(now);
        assert!(!code.is_expired_at(now));

        code.expires_at = Some(now - chrono::Duration::seconds(1));
        assert!(code.is_expired_at(now));
    }

    #[test]
    fn test_design_theme_parsing() {
        assert_eq!("birthday".parse::<DesignTheme>().unwrap(), DesignTheme::Birthday);
        assert_eq!(" Thank_You ".parse::<DesignTheme>().unwrap(), DesignTheme::ThankYou);
        assert!("neon".parse::<DesignTheme>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&GiftCardStatus::PartiallyUsed).unwrap();
        assert_eq!(json, "\"partially_used\"");
        assert!(GiftCardStatus::PartiallyUsed.is_redeemable());
        assert!(!GiftCardStatus::Cancelled.is_redeemable());
    }

    #[test]
    fn test_promo_deserializes_from_table_row() {
        let row = r#"{
            "id": "p-2",
            "code": "FLAT200",
            "discount_type": "fixed",
            "discount_value": 200,
            "is_active": true
        }"#;
        let code: PromoCode = serde_json::from_str(row).unwrap();
        assert_eq!(code.discount_type, DiscountType::Fixed);
        assert_eq!(code.max_uses, None);
        assert_eq!(code.min_purchase(), Money::zero());
    }
}
