//! # Checkout Error Types
//!
//! Error types for the record store, configuration and services.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Hosted table client error                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds context and categorization            │
//! │       │                                                                 │
//! │       ├──► validate(): logged, becomes { valid: false, error }         │
//! │       │                                                                 │
//! │       └──► redeem() / record_usage(): CheckoutError to the caller      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use thiserror::Error;

use lustre_core::gift_card::GiftCardRejection;
use lustre_core::CoreError;

// =============================================================================
// Store Error
// =============================================================================

/// Record store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with this ID.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A compare-and-update found the record changed or its limit reached.
    ///
    /// ## When This Occurs
    /// - `increment_promo_code_usage` once `current_uses == max_uses`
    #[error("Conflict on {entity} {id}: {reason}")]
    Conflict {
        entity: String,
        id: String,
        reason: String,
    },

    /// The hosted store could not be reached.
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    /// A record could not be decoded.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl StoreError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn conflict(
        entity: impl Into<String>,
        id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        StoreError::Conflict {
            entity: entity.into(),
            id: id.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::InvalidRecord(err.to_string())
    }
}

/// Result type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Config Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading or writing the config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is outside what the checkout accepts.
    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Failed to save config: {0}")]
    SaveFailed(String),

    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Checkout Error
// =============================================================================

/// Failures from operations that change state.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The gift card was refused; Display is the shopper-facing sentence.
    #[error(transparent)]
    GiftCard(#[from] GiftCardRejection),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Unit Tests
// =============================================================================
