//! # Gift Card Service
//!
//! Checks, redeems and converts gift cards through the record store.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate(code, total)             read only                           │
//! │  ├── normalize + format check      "Invalid gift card code format"     │
//! │  ├── find_gift_card_by_code        "Invalid gift card code"            │
//! │  └── check_gift_card               expired / empty / cannot be used    │
//! │                                                                         │
//! │  redeem(code, total)               one balance write                   │
//! │  └── update_gift_card_balance(id, read balance, remaining, status)     │
//! │                                                                         │
//! │  redeem_to_balance(code, account)  one balance write                   │
//! │  ├── update_gift_card_balance(id, read balance, 0, fully_redeemed)     │
//! │  └── account.credit(balance, expires in validity_months)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use lustre_core::balance::UserBalance;
use lustre_core::gift_card::{
    is_valid_gift_card_code_format, redeem_gift_card, validate_gift_card_record,
    GiftCardRedemption, GiftCardRejection, GiftCardValidation,
};
use lustre_core::money::Money;
use lustre_core::promo::normalize_code;
use lustre_core::{GiftCard, GIFT_CARD_VALIDITY_MONTHS};

use crate::error::CheckoutResult;
use crate::store::RecordStore;

#[derive(Clone)]
pub struct GiftCardService {
    store: Arc<dyn RecordStore>,
    balance_validity_months: u32,
}

impl GiftCardService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        GiftCardService {
            store,
            balance_validity_months: GIFT_CARD_VALIDITY_MONTHS,
        }
    }

    /// How long balance credited by [`Self::redeem_to_balance_at`] lasts.
    pub fn with_balance_validity(mut self, months: u32) -> Self {
        self.balance_validity_months = months;
        self
    }

    pub async fn validate(&self, code: &str, total: Money) -> GiftCardValidation {
        self.validate_at(code, total, Utc::now()).await
    }

    /// Checks a gift card against an order of `total`, as of `now`.
    ///
    /// Always resolves; store failures are logged and reported as
    /// `Failed to validate gift card`.
    pub async fn validate_at(
        &self,
        code: &str,
        total: Money,
        now: DateTime<Utc>,
    ) -> GiftCardValidation {
        let code = normalize_code(code);
        if !is_valid_gift_card_code_format(&code) {
            return GiftCardValidation::rejected(GiftCardRejection::InvalidFormat);
        }

        let card = match self.store.find_gift_card_by_code(&code).await {
            Ok(card) => card,
            Err(e) => {
                warn!(code = %code, error = %e, "Gift card lookup failed");
                return GiftCardValidation::rejected(GiftCardRejection::LookupFailed);
            }
        };

        let result = validate_gift_card_record(card, total, now);
        debug!(
            code = %code,
            total = %total,
            valid = result.valid,
            discount = %result.discount_amount,
            "Gift card validated"
        );
        result
    }

    pub async fn redeem(&self, code: &str, total: Money) -> CheckoutResult<GiftCardRedemption> {
        self.redeem_at(code, total, Utc::now()).await
    }

    /// Applies a gift card to a confirmed order and writes the new balance.
    ///
    /// The balance is written exactly once, and not at all when nothing
    /// was applied. The write is conditional on the balance that was read,
    /// so a concurrent redemption of the same card fails with a store
    /// conflict instead of spending the balance twice.
    pub async fn redeem_at(
        &self,
        code: &str,
        total: Money,
        now: DateTime<Utc>,
    ) -> CheckoutResult<GiftCardRedemption> {
        let card = self.lookup(code).await?;
        let redemption = redeem_gift_card(&card, total, now)?;

        if redemption.amount_applied.is_positive() {
            self.store
                .update_gift_card_balance(
                    &card.id,
                    card.balance(),
                    redemption.remaining_balance,
                    redemption.new_status,
                )
                .await?;
        }

        info!(
            gift_card_id = %card.id,
            applied = %redemption.amount_applied,
            remaining = %redemption.remaining_balance,
            status = %redemption.new_status,
            "Gift card redeemed"
        );
        Ok(redemption)
    }

    /// Moves a gift card's whole balance into `account`.
    ///
    /// `account` is only changed once the card's balance write succeeded.
    pub async fn redeem_to_balance_at(
        &self,
        code: &str,
        account: &mut UserBalance,
        now: DateTime<Utc>,
    ) -> CheckoutResult<GiftCardRedemption> {
        let card = self.lookup(code).await?;

        let mut staged = account.clone();
        let redemption = staged.credit_from_gift_card(&card, now, self.balance_validity_months)?;

        self.store
            .update_gift_card_balance(
                &card.id,
                card.balance(),
                redemption.remaining_balance,
                redemption.new_status,
            )
            .await?;
        *account = staged;

        info!(
            gift_card_id = %card.id,
            user_id = %account.user_id,
            credited = %redemption.amount_applied,
            "Gift card redeemed to account balance"
        );
        Ok(redemption)
    }

    async fn lookup(&self, code: &str) -> CheckoutResult<GiftCard> {
        let code = normalize_code(code);
        if !is_valid_gift_card_code_format(&code) {
            return Err(GiftCardRejection::InvalidFormat.into());
        }

        self.store
            .find_gift_card_by_code(&code)
            .await?
            .ok_or_else(|| GiftCardRejection::NotFound.into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CheckoutError, StoreError, StoreResult};
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use lustre_core::{DesignTheme, GiftCardStatus, PromoCode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 9, 30, 0).unwrap()
    }

    fn card(code: &str, balance: f64, status: GiftCardStatus) -> GiftCard {
        GiftCard {
            id: format!("id-{code}"),
            code: code.to_string(),
            amount: 1000.0,
            balance,
            status,
            design_theme: DesignTheme::Anniversary,
            purchased_at: now() - Duration::days(20),
            expires_at: now() + Duration::days(345),
            recipient_name: "Meera".to_string(),
            recipient_email: "meera@example.com".to_string(),
            sender_name: None,
            personal_message: None,
        }
    }

    async fn service_with(cards: Vec<GiftCard>) -> (GiftCardService, InMemoryStore) {
        let store = InMemoryStore::new();
        for c in cards {
            store.insert_gift_card(c).await;
        }
        (GiftCardService::new(Arc::new(store.clone())), store)
    }

    /// Wraps the in-memory store and counts balance writes.
    struct CountingStore {
        inner: InMemoryStore,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl RecordStore for CountingStore {
        async fn find_active_promo_code(&self, code: &str) -> StoreResult<Option<PromoCode>> {
            self.inner.find_active_promo_code(code).await
        }

        async fn increment_promo_code_usage(&self, id: &str) -> StoreResult<()> {
            self.inner.increment_promo_code_usage(id).await
        }

        async fn find_gift_card_by_code(&self, code: &str) -> StoreResult<Option<GiftCard>> {
            self.inner.find_gift_card_by_code(code).await
        }

        async fn update_gift_card_balance(
            &self,
            id: &str,
            expected_balance: Money,
            new_balance: Money,
            new_status: GiftCardStatus,
        ) -> StoreResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner
                .update_gift_card_balance(id, expected_balance, new_balance, new_status)
                .await
        }
    }

    #[tokio::test]
    async fn test_validate_normalizes_and_checks_format() {
        let (service, _) =
            service_with(vec![card("GIFT-AB12-CD34-EF56", 600.0, GiftCardStatus::PartiallyUsed)])
                .await;

        let ok = service
            .validate_at(" gift-ab12-cd34-ef56 ", Money::from_major_units(1000), now())
            .await;
        assert!(ok.valid);
        assert_eq!(ok.discount_amount, Money::from_major_units(600));

        let bad = service
            .validate_at("GIFT-AB12", Money::from_major_units(1000), now())
            .await;
        assert_eq!(bad.error.as_deref(), Some("Invalid gift card code format"));

        let missing = service
            .validate_at("GIFT-ZZZZ-ZZZZ-ZZZZ", Money::from_major_units(1000), now())
            .await;
        assert_eq!(missing.error.as_deref(), Some("Invalid gift card code"));
    }

    #[tokio::test]
    async fn test_redeem_writes_balance_once() {
        let inner = InMemoryStore::new();
        inner
            .insert_gift_card(card("GIFT-AB12-CD34-EF56", 1000.0, GiftCardStatus::Active))
            .await;
        let store = Arc::new(CountingStore {
            inner: inner.clone(),
            writes: AtomicUsize::new(0),
        });
        let service = GiftCardService::new(store.clone());

        let redemption = service
            .redeem_at("GIFT-AB12-CD34-EF56", Money::from_major_units(300), now())
            .await
            .unwrap();

        assert_eq!(redemption.remaining_balance, Money::from_major_units(700));
        assert_eq!(redemption.new_status, GiftCardStatus::PartiallyUsed);
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);

        let stored = inner.gift_card("id-GIFT-AB12-CD34-EF56").await.unwrap();
        assert_eq!(stored.balance(), Money::from_major_units(700));
        assert_eq!(stored.status, GiftCardStatus::PartiallyUsed);
    }

    /// Serves gift cards as they were when it was built, like a reader
    /// that lost a race with another checkout.
    struct SnapshotStore {
        inner: InMemoryStore,
        snapshot: GiftCard,
    }

    #[async_trait]
    impl RecordStore for SnapshotStore {
        async fn find_active_promo_code(&self, code: &str) -> StoreResult<Option<PromoCode>> {
            self.inner.find_active_promo_code(code).await
        }

        async fn increment_promo_code_usage(&self, id: &str) -> StoreResult<()> {
            self.inner.increment_promo_code_usage(id).await
        }

        async fn find_gift_card_by_code(&self, _: &str) -> StoreResult<Option<GiftCard>> {
            Ok(Some(self.snapshot.clone()))
        }

        async fn update_gift_card_balance(
            &self,
            id: &str,
            expected_balance: Money,
            new_balance: Money,
            new_status: GiftCardStatus,
        ) -> StoreResult<()> {
            self.inner
                .update_gift_card_balance(id, expected_balance, new_balance, new_status)
                .await
        }
    }

    #[tokio::test]
    async fn test_redeem_from_stale_read_is_refused() {
        let original = card("GIFT-AB12-CD34-EF56", 1000.0, GiftCardStatus::Active);
        let (service, store) = service_with(vec![original.clone()]).await;
        let stale = GiftCardService::new(Arc::new(SnapshotStore {
            inner: store.clone(),
            snapshot: original,
        }));

        service
            .redeem_at("GIFT-AB12-CD34-EF56", Money::from_major_units(300), now())
            .await
            .unwrap();

        let err = stale
            .redeem_at("GIFT-AB12-CD34-EF56", Money::from_major_units(800), now())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Store(StoreError::Conflict { .. })));

        let stored = store.gift_card("id-GIFT-AB12-CD34-EF56").await.unwrap();
        assert_eq!(stored.balance(), Money::from_major_units(700));
    }

    #[tokio::test]
    async fn test_stale_read_leaves_account_untouched() {
        let original = card("GIFT-AB12-CD34-EF56", 1000.0, GiftCardStatus::Active);
        let (service, store) = service_with(vec![original.clone()]).await;
        let stale = GiftCardService::new(Arc::new(SnapshotStore {
            inner: store.clone(),
            snapshot: original,
        }));

        service
            .redeem_at("GIFT-AB12-CD34-EF56", Money::from_major_units(300), now())
            .await
            .unwrap();

        let mut account = UserBalance::new("u-9");
        let err = stale
            .redeem_to_balance_at("GIFT-AB12-CD34-EF56", &mut account, now())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Store(StoreError::Conflict { .. })));
        assert_eq!(account.balance, Money::zero());
        assert!(account.transactions.is_empty());
    }

    #[tokio::test]
    async fn test_redeem_zero_total_writes_nothing() {
        let inner = InMemoryStore::new();
        inner
            .insert_gift_card(card("GIFT-AB12-CD34-EF56", 1000.0, GiftCardStatus::Active))
            .await;
        let store = Arc::new(CountingStore {
            inner,
            writes: AtomicUsize::new(0),
        });
        let service = GiftCardService::new(store.clone());

        let redemption = service
            .redeem_at("GIFT-AB12-CD34-EF56", Money::zero(), now())
            .await
            .unwrap();
        assert_eq!(redemption.amount_applied, Money::zero());
        assert_eq!(redemption.new_status, GiftCardStatus::Active);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_redeem_rejections() {
        let (service, _) = service_with(vec![
            card("GIFT-CANC-ELLE-D000", 1000.0, GiftCardStatus::Cancelled),
            card("GIFT-USED-UPUP-0000", 0.0, GiftCardStatus::FullyRedeemed),
        ])
        .await;

        let err = service
            .redeem_at("GIFT-CANC-ELLE-D000", Money::from_major_units(100), now())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "This gift card cannot be used");

        let err = service
            .redeem_at("GIFT-USED-UPUP-0000", Money::from_major_units(100), now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::GiftCard(GiftCardRejection::NoRemainingBalance)
        ));

        let err = service
            .redeem_at("GIFT-NONE-NONE-NONE", Money::from_major_units(100), now())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid gift card code");
    }

    #[tokio::test]
    async fn test_redeem_to_balance() {
        let (service, store) =
            service_with(vec![card("GIFT-AB12-CD34-EF56", 800.0, GiftCardStatus::PartiallyUsed)])
                .await;
        let service = service.with_balance_validity(6);
        let mut account = UserBalance::new("u-7");

        let redemption = service
            .redeem_to_balance_at("GIFT-AB12-CD34-EF56", &mut account, now())
            .await
            .unwrap();

        assert_eq!(redemption.amount_applied, Money::from_major_units(800));
        assert_eq!(account.available(now()), Money::from_major_units(800));
        assert_eq!(
            account.tranches[0].expires_at,
            Some(lustre_core::gift_card::add_months(now(), 6))
        );

        let stored = store.gift_card("id-GIFT-AB12-CD34-EF56").await.unwrap();
        assert_eq!(stored.balance(), Money::zero());
        assert_eq!(stored.status, GiftCardStatus::FullyRedeemed);

        // a second attempt finds nothing left and leaves the account alone
        let err = service
            .redeem_to_balance_at("GIFT-AB12-CD34-EF56", &mut account, now())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "This gift card has no remaining balance");
        assert_eq!(account.balance, Money::from_major_units(800));
    }
}
