//! # Error Types
//!
//! Domain-specific error types for lustre-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lustre-core errors (this file)                                        │
//! │  ├── CoreError        - Balance and issuing failures                   │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  Rule rejections (next to their rules)                                 │
//! │  ├── promo::PromoCodeRejection                                         │
//! │  └── gift_card::GiftCardRejection                                      │
//! │                                                                         │
//! │  lustre-checkout errors (separate crate)                               │
//! │  └── StoreError       - Record store failures                          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → Storefront        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Display text is the sentence the shopper sees, no error codes
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// Account balance cannot cover a debit.
    ///
    /// ## When This Occurs
    /// - Checkout asks for more balance than has been credited
    /// - Part of the balance expired before checkout
    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: Money, requested: Money },

    /// A credit or debit amount was zero or negative.
    #[error("Invalid balance amount: {reason}")]
    InvalidBalanceAmount { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// `field` is the human label ("Recipient email"), so `to_string()` can be
/// shown to the shopper as-is.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Amount is outside the allowed range (inclusive).
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: Money, max: Money },

    /// Amount is not a whole multiple of `step` rupees.
    #[error("{field} must be a multiple of {step}")]
    NotMultipleOf { field: String, step: i64 },

    /// Value does not parse as a number.
    #[error("{field} must be a valid number")]
    NotANumber { field: String },

    /// Invalid format (e.g., malformed email or phone).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {}", .allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
