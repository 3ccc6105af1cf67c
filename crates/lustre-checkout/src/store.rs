//! # Record Store
//!
//! The seam between checkout services and the hosted tables.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Record Store Seam                                    │
//! │                                                                         │
//! │  PromoCodeService / GiftCardService                                    │
//! │       │                                                                 │
//! │       │  store.find_active_promo_code("GIFT5")                         │
//! │       ▼                                                                 │
//! │  dyn RecordStore                                                       │
//! │  ├── find_active_promo_code(code)                                      │
//! │  ├── increment_promo_code_usage(id)     compare-and-increment          │
//! │  ├── find_gift_card_by_code(code)                                      │
//! │  └── update_gift_card_balance(id, expected, balance, status)  CAS      │
//! │       │                                                                 │
//! │       ├──► InMemoryStore (this module: tests, CLI seed files)          │
//! │       └──► hosted table client (deployment)                            │
//! │                                                                         │
//! │  Services never see SQL, row filters or client types.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use lustre_core::money::Money;
use lustre_core::{GiftCard, GiftCardStatus, PromoCode};

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Record Store Trait
// =============================================================================

/// Lookups and writes the checkout needs from the hosted tables.
///
/// Codes passed in are already normalized (trimmed, uppercase).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Active promo code with exactly this code, if any.
    async fn find_active_promo_code(&self, code: &str) -> StoreResult<Option<PromoCode>>;

    /// Adds one use, refusing once `max_uses` is reached.
    ///
    /// Not idempotent: call once per confirmed checkout.
    async fn increment_promo_code_usage(&self, id: &str) -> StoreResult<()>;

    async fn find_gift_card_by_code(&self, code: &str) -> StoreResult<Option<GiftCard>>;

    /// Writes a new balance and status, but only while the stored balance
    /// still equals `expected_balance`.
    ///
    /// ## Errors
    /// `Conflict` when another redemption changed the balance first.
    async fn update_gift_card_balance(
        &self,
        id: &str,
        expected_balance: Money,
        new_balance: Money,
        new_status: GiftCardStatus,
    ) -> StoreResult<()>;
}

// =============================================================================
// Seed
// =============================================================================

/// Records to preload an [`InMemoryStore`] with.
///
/// ```json
/// { "promo_codes": [ { "code": "GIFT5", ... } ], "gift_cards": [] }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSeed {
    #[serde(default)]
    pub promo_codes: Vec<PromoCode>,
    #[serde(default)]
    pub gift_cards: Vec<GiftCard>,
}

impl StoreSeed {
    pub fn from_json(json: &str) -> StoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn from_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

#[derive(Debug, Default)]
struct Tables {
    // keyed by id
    promo_codes: HashMap<String, PromoCode>,
    gift_cards: HashMap<String, GiftCard>,
}

/// A [`RecordStore`] held in memory.
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: StoreSeed) -> Self {
        let tables = Tables {
            promo_codes: seed
                .promo_codes
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect(),
            gift_cards: seed
                .gift_cards
                .into_iter()
                .map(|g| (g.id.clone(), g))
                .collect(),
        };
        InMemoryStore {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    pub async fn insert_promo_code(&self, promo: PromoCode) {
        self.tables
            .write()
            .await
            .promo_codes
            .insert(promo.id.clone(), promo);
    }

    pub async fn insert_gift_card(&self, card: GiftCard) {
        self.tables
            .write()
            .await
            .gift_cards
            .insert(card.id.clone(), card);
    }

    pub async fn promo_code(&self, id: &str) -> Option<PromoCode> {
        self.tables.read().await.promo_codes.get(id).cloned()
    }

    pub async fn gift_card(&self, id: &str) -> Option<GiftCard> {
        self.tables.read().await.gift_cards.get(id).cloned()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn find_active_promo_code(&self, code: &str) -> StoreResult<Option<PromoCode>> {
        let tables = self.tables.read().await;
        let found = tables
            .promo_codes
            .values()
            .find(|p| p.is_active && p.code == code)
            .cloned();

        debug!(code = %code, found = found.is_some(), "Promo code lookup");
        Ok(found)
    }

    async fn increment_promo_code_usage(&self, id: &str) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let promo = tables
            .promo_codes
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("PromoCode", id))?;

        if promo.is_usage_exhausted() {
            return Err(StoreError::conflict("PromoCode", id, "usage limit reached"));
        }

        promo.current_uses += 1;
        debug!(id = %id, current_uses = promo.current_uses, "Promo code usage incremented");
        Ok(())
    }

    async fn find_gift_card_by_code(&self, code: &str) -> StoreResult<Option<GiftCard>> {
        let tables = self.tables.read().await;
        let found = tables
            .gift_cards
            .values()
            .find(|g| g.code == code)
            .cloned();

        debug!(code = %code, found = found.is_some(), "Gift card lookup");
        Ok(found)
    }

    async fn update_gift_card_balance(
        &self,
        id: &str,
        expected_balance: Money,
        new_balance: Money,
        new_status: GiftCardStatus,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let card = tables
            .gift_cards
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("GiftCard", id))?;

        if card.balance() != expected_balance {
            return Err(StoreError::conflict("GiftCard", id, "balance changed since it was read"));
        }

        if new_balance.is_negative() || new_balance > card.face_value() {
            return Err(StoreError::InvalidRecord(format!(
                "balance {new_balance} outside 0..={}",
                card.face_value()
            )));
        }

        card.balance = new_balance.to_major();
        card.status = new_status;
        debug!(id = %id, balance = %new_balance, status = %new_status, "Gift card balance updated");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
