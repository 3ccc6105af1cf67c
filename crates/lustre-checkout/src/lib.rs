//! # lustre-checkout: Checkout Services for the Lustre Storefront
//!
//! Connects the pure rules in `lustre-core` to the record store and to
//! uploaded files.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lustre Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             Storefront / apps/lustre-cli                        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ lustre-checkout (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   PromoCodeService   GiftCardService   validate_csv_file        │   │
//! │  │          │                  │                  │                │   │
//! │  │          └──── dyn RecordStore ────┘     dyn UploadedFile       │   │
//! │  │                                                                 │   │
//! │  │   CheckoutConfig (checkout.toml + LUSTRE_* env)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                lustre-core (pure rules)                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`store`] - `RecordStore` trait and the in-memory store
//! - [`promo`] - Promo code validation and usage counting
//! - [`gift_card`] - Gift card validation, redemption, conversion to balance
//! - [`upload`] - Uploaded files and bulk order file validation
//! - [`config`] - checkout.toml loading
//! - [`error`] - Store, config and checkout errors

pub mod config;
pub mod error;
pub mod gift_card;
pub mod promo;
pub mod store;
pub mod upload;

pub use config::CheckoutConfig;
pub use error::{CheckoutError, ConfigError, StoreError};
pub use gift_card::GiftCardService;
pub use promo::PromoCodeService;
pub use store::{InMemoryStore, RecordStore, StoreSeed};
pub use upload::{validate_csv_file, InMemoryFile, LocalFile, UploadedFile};
