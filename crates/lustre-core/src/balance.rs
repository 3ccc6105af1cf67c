//! # Account Balance
//!
//! Value a shopper moved from gift cards into their account. Each credit is
//! its own tranche with its own expiry, so a balance can lapse piece by piece.
//!
//! ## Tranches
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UserBalance (user u-42)                                                │
//! │                                                                         │
//! │  tranche  source          remaining   expires_at                        │
//! │  ───────  ──────────────  ─────────   ──────────                        │
//! │  t-1      GIFT-AB12-...   ₹300        2026-08-01   ← debited first       │
//! │  t-2      GIFT-QW99-...   ₹2,000      2027-01-15                         │
//! │                                                                         │
//! │  available(now) = sum of unexpired remaining                            │
//! │  debit(amount)  = earliest-expiring tranche first                       │
//! │  expire(now)    = zero lapsed tranches, log an expiry transaction       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::gift_card::{
    add_months, check_gift_card, is_expired, is_within_expiry_warning, GiftCardRedemption,
    GiftCardRejection,
};
use crate::money::Money;
use crate::types::{GiftCard, GiftCardStatus};

// =============================================================================
// Transactions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BalanceTransactionKind {
    Credit,
    Debit,
    /// An unspent tranche lapsed.
    Expiry,
}

/// One change to an account balance, with the balance on either side of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserBalanceTransaction {
    pub id: String,
    pub kind: BalanceTransactionKind,
    pub amount: Money,
    pub balance_before: Money,
    pub balance_after: Money,
    pub gift_card_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Unspent part of one credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BalanceTranche {
    /// Credit transaction that opened this tranche.
    pub transaction_id: String,
    pub gift_card_id: Option<String>,
    pub remaining: Money,
    /// `None` never expires.
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl BalanceTranche {
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| is_expired(at, now))
    }
}

// =============================================================================
// User Balance
// =============================================================================

/// A user's account balance and its history.
///
/// ## Invariants
/// - `balance` equals the sum of tranche `remaining` values
/// - every transaction satisfies `balance_after = balance_before ± amount`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserBalance {
    pub user_id: String,
    pub balance: Money,
    #[serde(default)]
    pub tranches: Vec<BalanceTranche>,
    #[serde(default)]
    pub transactions: Vec<UserBalanceTransaction>,
}

impl UserBalance {
    pub fn new(user_id: impl Into<String>) -> Self {
        UserBalance {
            user_id: user_id.into(),
            balance: Money::zero(),
            tranches: Vec::new(),
            transactions: Vec::new(),
        }
    }

    /// Spendable balance at `now`.
    pub fn available(&self, now: DateTime<Utc>) -> Money {
        self.tranches
            .iter()
            .filter(|t| !t.is_expired_at(now))
            .map(|t| t.remaining)
            .sum()
    }

    /// Adds a tranche that expires `validity_months` after `redeemed_at`.
    ///
    /// A `validity_months` of zero means the tranche never expires.
    ///
    /// ## Errors
    /// `InvalidBalanceAmount` for zero or negative amounts.
    pub fn credit(
        &mut self,
        amount: Money,
        gift_card_id: Option<String>,
        redeemed_at: DateTime<Utc>,
        validity_months: u32,
    ) -> CoreResult<&UserBalanceTransaction> {
        if !amount.is_positive() {
            return Err(CoreError::InvalidBalanceAmount {
                reason: format!("credit must be positive, got {amount}"),
            });
        }

        let expires_at = (validity_months > 0).then(|| add_months(redeemed_at, validity_months));
        let id = self.record(
            BalanceTransactionKind::Credit,
            amount,
            gift_card_id.clone(),
            expires_at,
            redeemed_at,
        );

        self.tranches.push(BalanceTranche {
            transaction_id: id,
            gift_card_id,
            remaining: amount,
            expires_at,
        });

        Ok(self.last_transaction())
    }

    /// Moves a gift card's whole remaining balance into this account.
    ///
    /// The returned redemption carries the card's new state
    /// (`0`, fully redeemed) for the caller to write back.
    pub fn credit_from_gift_card(
        &mut self,
        card: &GiftCard,
        now: DateTime<Utc>,
        validity_months: u32,
    ) -> Result<GiftCardRedemption, GiftCardRejection> {
        check_gift_card(card, now)?;

        let amount = card.balance();
        self.credit(amount, Some(card.id.clone()), now, validity_months)
            .map_err(|_| GiftCardRejection::NoRemainingBalance)?;

        Ok(GiftCardRedemption {
            gift_card_id: card.id.clone(),
            amount_applied: amount,
            remaining_balance: Money::zero(),
            new_status: GiftCardStatus::FullyRedeemed,
        })
    }

    /// Zeroes every lapsed tranche, recording one expiry transaction each.
    ///
    /// Returns the total that expired.
    pub fn expire(&mut self, now: DateTime<Utc>) -> Money {
        let lapsed: Vec<(Money, Option<String>, Option<DateTime<Utc>>)> = self
            .tranches
            .iter()
            .filter(|t| t.remaining.is_positive() && t.is_expired_at(now))
            .map(|t| (t.remaining, t.gift_card_id.clone(), t.expires_at))
            .collect();

        self.tranches.retain(|t| !t.is_expired_at(now));

        let mut total = Money::zero();
        for (amount, gift_card_id, expires_at) in lapsed {
            self.record(BalanceTransactionKind::Expiry, amount, gift_card_id, expires_at, now);
            total += amount;
        }
        total
    }

    /// Spends `amount`, oldest expiry first.
    ///
    /// Lapsed tranches are swept before the check.
    ///
    /// ## Errors
    /// - `InvalidBalanceAmount` for zero or negative amounts
    /// - `InsufficientBalance` when `amount` exceeds what is available
    pub fn debit(&mut self, amount: Money, now: DateTime<Utc>) -> CoreResult<&UserBalanceTransaction> {
        if !amount.is_positive() {
            return Err(CoreError::InvalidBalanceAmount {
                reason: format!("debit must be positive, got {amount}"),
            });
        }

        self.expire(now);

        let available = self.available(now);
        if amount > available {
            return Err(CoreError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        // never-expiring tranches go last
        self.tranches
            .sort_by_key(|t| (t.expires_at.is_none(), t.expires_at));

        let mut left = amount;
        for tranche in self.tranches.iter_mut() {
            if left.is_zero() {
                break;
            }
            let take = tranche.remaining.min(left);
            tranche.remaining -= take;
            left -= take;
        }
        self.tranches.retain(|t| t.remaining.is_positive());

        self.record(BalanceTransactionKind::Debit, amount, None, None, now);
        Ok(self.last_transaction())
    }

    /// Tranches that lapse within `warning_days`, soonest first.
    pub fn expiring_within(&self, now: DateTime<Utc>, warning_days: i64) -> Vec<&BalanceTranche> {
        let mut expiring: Vec<&BalanceTranche> = self
            .tranches
            .iter()
            .filter(|t| {
                t.remaining.is_positive()
                    && t.expires_at
                        .is_some_and(|at| is_within_expiry_warning(at, now, warning_days))
            })
            .collect();
        expiring.sort_by_key(|t| t.expires_at);
        expiring
    }

    fn record(
        &mut self,
        kind: BalanceTransactionKind,
        amount: Money,
        gift_card_id: Option<String>,
        expires_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> String {
        let balance_before = self.balance;
        let balance_after = match kind {
            BalanceTransactionKind::Credit => balance_before + amount,
            BalanceTransactionKind::Debit | BalanceTransactionKind::Expiry => {
                balance_before - amount
            }
        };
        self.balance = balance_after;

        let id = Uuid::new_v4().to_string();
        self.transactions.push(UserBalanceTransaction {
            id: id.clone(),
            kind,
            amount,
            balance_before,
            balance_after,
            gift_card_id,
            expires_at,
            created_at,
        });
        id
    }

    fn last_transaction(&self) -> &UserBalanceTransaction {
        // record() always pushes before this is called
        &self.transactions[self.transactions.len() - 1]
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DesignTheme;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 9, 30, 0).unwrap()
    }

    fn rs(rupees: i64) -> Money {
        Money::from_major_units(rupees)
    }

    fn gift_card(balance: f64) -> GiftCard {
        GiftCard {
            id: "gc-9".to_string(),
            code: "GIFT-QW99-ER88-TY77".to_string(),
            amount: 2000.0,
            balance,
            status: GiftCardStatus::PartiallyUsed,
            design_theme: DesignTheme::Classic,
            purchased_at: now() - Duration::days(10),
            expires_at: now() + Duration::days(355),
            recipient_name: "Nisha".to_string(),
            recipient_email: "nisha@example.com".to_string(),
            sender_name: None,
            personal_message: None,
        }
    }

    #[test]
    fn test_credit_records_before_and_after() {
        let mut account = UserBalance::new("u-42");
        account.credit(rs(500), None, now(), 12).unwrap();
        let tx = account.credit(rs(300), None, now(), 12).unwrap();

        assert_eq!(tx.kind, BalanceTransactionKind::Credit);
        assert_eq!(tx.balance_before, rs(500));
        assert_eq!(tx.balance_after, rs(800));
        assert_eq!(tx.expires_at, Some(add_months(now(), 12)));
        assert_eq!(account.available(now()), rs(800));
    }

    #[test]
    fn test_credit_rejects_non_positive() {
        let mut account = UserBalance::new("u-42");
        assert!(matches!(
            account.credit(Money::zero(), None, now(), 12),
            Err(CoreError::InvalidBalanceAmount { .. })
        ));
    }

    #[test]
    fn test_debit_spends_earliest_expiry_first() {
        let mut account = UserBalance::new("u-42");
        account.credit(rs(2000), None, now(), 12).unwrap();
        account.credit(rs(300), None, now() - Duration::days(300), 12).unwrap();
        account.credit(rs(100), None, now(), 0).unwrap();

        account.debit(rs(500), now()).unwrap();

        // the ₹300 tranche from 300 days ago is gone, ₹200 came from the next one
        assert_eq!(account.tranches.len(), 2);
        assert_eq!(account.tranches[0].remaining, rs(1800));
        assert_eq!(account.tranches[1].expires_at, None);
        assert_eq!(account.balance, rs(1900));
    }

    #[test]
    fn test_debit_refuses_more_than_available() {
        let mut account = UserBalance::new("u-42");
        account.credit(rs(300), None, now(), 12).unwrap();

        let err = account.debit(rs(500), now()).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientBalance {
                available: rs(300),
                requested: rs(500)
            }
        );
        assert_eq!(account.balance, rs(300));
    }

    #[test]
    fn test_tranches_expire_independently() {
        let mut account = UserBalance::new("u-42");
        account.credit(rs(400), None, now() - Duration::days(400), 12).unwrap();
        account.credit(rs(600), None, now(), 12).unwrap();

        assert_eq!(account.available(now()), rs(600));
        assert_eq!(account.expire(now()), rs(400));
        assert_eq!(account.balance, rs(600));

        let last = account.transactions.last().unwrap();
        assert_eq!(last.kind, BalanceTransactionKind::Expiry);
        assert_eq!(last.balance_after, rs(600));

        // sweeping twice changes nothing
        assert_eq!(account.expire(now()), Money::zero());
    }

    #[test]
    fn test_expiring_within_window() {
        let mut account = UserBalance::new("u-42");
        // expires in about 20 days
        account.credit(rs(250), None, now() - Duration::days(345), 12).unwrap();
        account.credit(rs(900), None, now(), 12).unwrap();

        let soon = account.expiring_within(now(), 30);
        assert_eq!(soon.len(), 1);
        assert_eq!(soon[0].remaining, rs(250));
    }

    #[test]
    fn test_credit_from_gift_card() {
        let mut account = UserBalance::new("u-42");
        let redemption = account.credit_from_gift_card(&gift_card(750.0), now(), 12).unwrap();

        assert_eq!(redemption.amount_applied, rs(750));
        assert_eq!(redemption.new_status, GiftCardStatus::FullyRedeemed);
        assert_eq!(account.available(now()), rs(750));
        assert_eq!(account.tranches[0].gift_card_id.as_deref(), Some("gc-9"));

        let err = account.credit_from_gift_card(&gift_card(0.0), now(), 12).unwrap_err();
        assert_eq!(err, GiftCardRejection::NoRemainingBalance);
    }
}
