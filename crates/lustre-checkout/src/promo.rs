//! # Promo Code Service
//!
//! Looks promo codes up through the record store and applies the rules in
//! [`lustre_core::promo`].
//!
//! ## User Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Shopper types "gift5" at checkout                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate("gift5", ₹2,000)         ← any number of times, no writes    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  { valid: true, discount_amount: ₹100 }                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  order confirmed                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  record_usage(promo.id)            ← exactly once per checkout         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use lustre_core::money::Money;
use lustre_core::promo::{
    normalize_code, validate_promo_record, PromoCodeRejection, PromoCodeValidation,
};

use crate::error::CheckoutResult;
use crate::store::RecordStore;

#[derive(Clone)]
pub struct PromoCodeService {
    store: Arc<dyn RecordStore>,
}

impl PromoCodeService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        PromoCodeService { store }
    }

    /// Validates `code` against an order of `total`, as of now.
    pub async fn validate(&self, code: &str, total: Money) -> PromoCodeValidation {
        self.validate_at(code, total, Utc::now()).await
    }

    /// Validates `code` against an order of `total`, as of `now`.
    ///
    /// Always resolves; store failures are logged and reported as an
    /// invalid code.
    pub async fn validate_at(
        &self,
        code: &str,
        total: Money,
        now: DateTime<Utc>,
    ) -> PromoCodeValidation {
        let code = normalize_code(code);
        if code.is_empty() {
            return PromoCodeValidation::rejected(PromoCodeRejection::NotFound);
        }

        let record = match self.store.find_active_promo_code(&code).await {
            Ok(record) => record,
            Err(e) => {
                warn!(code = %code, error = %e, "Promo code lookup failed");
                return PromoCodeValidation::rejected(PromoCodeRejection::NotFound);
            }
        };

        let result = validate_promo_record(record, total, now);
        debug!(
            code = %code,
            total = %total,
            valid = result.valid,
            discount = %result.discount_amount,
            "Promo code validated"
        );
        result
    }

    /// Counts one use of the promo code. Call after checkout is confirmed.
    pub async fn record_usage(&self, promo_code_id: &str) -> CheckoutResult<()> {
        self.store.increment_promo_code_usage(promo_code_id).await?;
        info!(promo_code_id = %promo_code_id, "Promo code usage recorded");
        Ok(())
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
    use lustre_core::{DiscountType, GiftCard, GiftCardStatus, PromoCode};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 9, 30, 0).unwrap()
    }

    fn gift5() -> PromoCode {
        PromoCode {
            id: "promo-gift5".to_string(),
            code: "GIFT5".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 5.0,
            min_purchase_amount: 1000.0,
            max_uses: Some(1),
            current_uses: 0,
            is_active: true,
            expires_at: None,
        }
    }

    async fn service_with(codes: Vec<PromoCode>) -> (PromoCodeService, InMemoryStore) {
        let store = InMemoryStore::new();
        for code in codes {
            store.insert_promo_code(code).await;
        }
        (PromoCodeService::new(Arc::new(store.clone())), store)
    }

    /// Every call fails, like an unreachable hosted store.
    struct DownStore;

    #[async_trait]
    impl RecordStore for DownStore {
        async fn find_active_promo_code(&self, _: &str) -> StoreResult<Option<PromoCode>> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn increment_promo_code_usage(&self, _: &str) -> StoreResult<()> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn find_gift_card_by_code(&self, _: &str) -> StoreResult<Option<GiftCard>> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn update_gift_card_balance(
            &self,
            _: &str,
            _: Money,
            _: Money,
            _: GiftCardStatus,
        ) -> StoreResult<()> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_lowercase_code_is_normalized() {
        let (service, _) = service_with(vec![gift5()]).await;
        let result = service
            .validate_at("  gift5 ", Money::from_major_units(2000), now())
            .await;

        assert!(result.valid);
        assert_eq!(result.discount_amount, Money::from_major_units(100));
    }

    #[tokio::test]
    async fn test_unknown_and_empty_codes() {
        let (service, _) = service_with(vec![gift5()]).await;

        for code in ["NOPE", "   "] {
            let result = service.validate_at(code, Money::from_major_units(2000), now()).await;
            assert_eq!(result.error.as_deref(), Some("Invalid promo code"));
        }
    }

    #[tokio::test]
    async fn test_expired_code() {
        let expired = PromoCode {
            id: "promo-exp".to_string(),
            code: "EXPIRED1".to_string(),
            expires_at: Some(now() - Duration::days(1)),
            ..gift5()
        };
        let (service, _) = service_with(vec![expired]).await;

        let result = service
            .validate_at("EXPIRED1", Money::from_major_units(2000), now())
            .await;
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("This promo code has expired"));
    }

    #[tokio::test]
    async fn test_store_failure_becomes_invalid_result() {
        let service = PromoCodeService::new(Arc::new(DownStore));
        let result = service.validate("GIFT5", Money::from_major_units(2000)).await;
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("Invalid promo code"));

        let err = service.record_usage("promo-gift5").await.unwrap_err();
        assert!(matches!(err, CheckoutError::Store(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_validation_does_not_count_usage() {
        let (service, store) = service_with(vec![gift5()]).await;
        let total = Money::from_major_units(2000);

        for _ in 0..3 {
            assert!(service.validate_at("GIFT5", total, now()).await.valid);
        }
        assert_eq!(store.promo_code("promo-gift5").await.unwrap().current_uses, 0);

        service.record_usage("promo-gift5").await.unwrap();
        assert_eq!(store.promo_code("promo-gift5").await.unwrap().current_uses, 1);

        // max_uses = 1 is now reached
        let result = service.validate_at("GIFT5", total, now()).await;
        assert_eq!(
            result.error.as_deref(),
            Some("This promo code has reached its usage limit")
        );
        assert!(service.record_usage("promo-gift5").await.is_err());
    }
}
