//! # lustre-core: Pure Checkout Rules for the Lustre Storefront
//!
//! This crate holds the business rules behind promo codes, gift cards,
//! account balance and bulk gift card orders, as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lustre Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Storefront (React)                           │   │
//! │  │    Cart ──► Checkout ──► Gift Cards ──► Bulk Order Upload       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    lustre-checkout                              │   │
//! │  │    PromoCodeService, GiftCardService, validate_csv_file         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ lustre-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌──────────┐ ┌───────┐ │   │
//! │  │   │  money  │ │  promo  │ │ gift_card │ │bulk_order│ │discount│ │   │
//! │  │   │  Money  │ │ evaluate│ │  expiry   │ │ csv rows │ │compose│ │   │
//! │  │   └─────────┘ └─────────┘ └───────────┘ └──────────┘ └───────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO RECORD STORE • NO NETWORK • PURE FUNCTIONS        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic and display formatting
//! - [`types`] - Records read from the hosted store (PromoCode, GiftCard)
//! - [`promo`] - Promo code rules and discount computation
//! - [`gift_card`] - Gift card format, expiry, balance and redemption rules
//! - [`balance`] - Account balance credited from redeemed gift cards
//! - [`bulk_order`] - Bulk gift card order CSV validator
//! - [`discount`] - Combines several discounts into a payable amount
//! - [`validation`] - Field validators shared by the modules above
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use lustre_core::discount::{calculate_bulk_discount, qualifies_for_bulk_discount};
//! use lustre_core::money::Money;
//!
//! let total = Money::from_major_units(12_000);
//! assert!(qualifies_for_bulk_discount(12));
//! assert_eq!(calculate_bulk_discount(total), Money::from_major_units(1_200));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod balance;
pub mod bulk_order;
pub mod discount;
pub mod error;
pub mod gift_card;
pub mod money;
pub mod promo;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Smallest gift card face value, in rupees.
pub const MIN_GIFT_CARD_AMOUNT: i64 = 500;

/// Largest gift card face value, in rupees.
pub const MAX_GIFT_CARD_AMOUNT: i64 = 50_000;

/// Gift card face values must be a whole multiple of this many rupees.
pub const GIFT_CARD_AMOUNT_STEP: i64 = 100;

/// How long a gift card stays redeemable after purchase.
pub const GIFT_CARD_VALIDITY_MONTHS: u32 = 12;

/// Prefix shared by every gift card code (`GIFT-XXXX-XXXX-XXXX`).
pub const GIFT_CARD_CODE_PREFIX: &str = "GIFT";

/// Longest personal or custom message printed on a gift card.
pub const MAX_GIFT_MESSAGE_CHARS: usize = 200;
