use super::ids::{AccountId, BalanceId};
use super::money::{Money, Price};
use crate::error::{PaymentError, Result};
use serde::{Deserialize, Serialize};

/// The current spendable amount of an account.
///
/// The store owns the authoritative value; a `Balance` held by a use case
/// is a snapshot valid for the duration of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub id: BalanceId,
    pub account_id: AccountId,
    pub amount: Money,
}

impl Balance {
    pub fn new(id: BalanceId, account_id: AccountId, amount: Money) -> Self {
        Self {
            id,
            account_id,
            amount,
        }
    }

    /// Produces the next snapshot after applying a balance transaction.
    ///
    /// Fails when the new amount overflows or would be rounded, so the stored
    /// amount always moves by exactly `tx.amount`.
    pub fn apply(&self, tx: &BalanceTransaction) -> Result<Self> {
        let amount = self.amount.checked_add(tx.amount).ok_or_else(|| {
            PaymentError::ValidationError(format!(
                "Delta {} cannot be applied exactly to balance {} of account {}",
                tx.amount, self.amount, self.account_id
            ))
        })?;
        Ok(Self {
            id: self.id,
            account_id: self.account_id,
            amount,
        })
    }
}

/// A signed delta applied against an account's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceTransaction {
    pub account_id: AccountId,
    pub amount: Money,
}

impl BalanceTransaction {
    pub fn new(account_id: AccountId, amount: Money) -> Self {
        Self { account_id, amount }
    }

    /// A debit of `price`, i.e. a delta of `-price`.
    pub fn debit(account_id: AccountId, price: Price) -> Self {
        Self::new(account_id, -Money::from(price))
    }
}
