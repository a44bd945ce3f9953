use crate::domain::balance::{Balance, BalanceTransaction};
use crate::domain::ids::{AccountId, BalanceId, PaymentId};
use crate::domain::money::Money;
use crate::domain::payment::Payment;
use crate::domain::ports::{BalancePort, PaymentPort};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for account balances.
///
/// Uses `Arc<RwLock<HashMap<AccountId, Balance>>>` to allow shared concurrent access.
/// `apply_delta` holds the write lock for the whole read-modify-write, so a
/// single call is atomic.
#[derive(Default, Clone)]
pub struct InMemoryBalanceStore {
    balances: Arc<RwLock<HashMap<AccountId, Balance>>>,
}

impl InMemoryBalanceStore {
    /// Creates a new, empty in-memory balance store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the balance of a new account with an initial amount.
    pub async fn open(&self, account_id: AccountId, amount: Money) -> Result<Balance> {
        let mut balances = self.balances.write().await;
        if balances.contains_key(&account_id) {
            return Err(PaymentError::ValidationError(format!(
                "Balance for account {account_id} already exists"
            )));
        }
        let id = BalanceId::new(balances.len() as u64 + 1);
        let balance = Balance::new(id, account_id, amount);
        balances.insert(account_id, balance.clone());
        Ok(balance)
    }

    /// All balances, ordered by account.
    pub async fn all_balances(&self) -> Result<Vec<Balance>> {
        let balances = self.balances.read().await;
        let mut all: Vec<Balance> = balances.values().cloned().collect();
        all.sort_by_key(|b| b.account_id);
        Ok(all)
    }
}

#[async_trait]
impl BalancePort for InMemoryBalanceStore {
    async fn get_balance(&self, account_id: AccountId) -> Result<Option<Balance>> {
        let balances = self.balances.read().await;
        Ok(balances.get(&account_id).cloned())
    }

    async fn apply_delta(&self, account_id: AccountId, amount: Money) -> Result<Balance> {
        let mut balances = self.balances.write().await;
        let balance = balances
            .get_mut(&account_id)
            .ok_or(PaymentError::BalanceNotFound(account_id))?;
        *balance = balance.apply(&BalanceTransaction::new(account_id, amount))?;
        Ok(balance.clone())
    }
}

/// A thread-safe in-memory store for payments.
///
/// Identities are assigned sequentially from 1 in save order.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<Vec<Payment>>>,
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All saved payments, ordered by id.
    pub async fn all_payments(&self) -> Result<Vec<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.clone())
    }
}

#[async_trait]
impl PaymentPort for InMemoryPaymentStore {
    async fn save(&self, payment: Payment) -> Result<Payment> {
        let mut payments = self.payments.write().await;
        let saved = payment.with_id(PaymentId::new(payments.len() as u64 + 1));
        payments.push(saved.clone());
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Price;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_in_memory_balance_store() {
        let store = InMemoryBalanceStore::new();
        let opened = store
            .open(AccountId::new(1), Money::new(dec!(100.0)))
            .await
            .unwrap();

        let retrieved = store.get_balance(AccountId::new(1)).await.unwrap().unwrap();
        assert_eq!(retrieved, opened);

        assert!(store.get_balance(AccountId::new(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_twice_is_rejected() {
        let store = InMemoryBalanceStore::new();
        store.open(AccountId::new(1), Money::ZERO).await.unwrap();
        assert!(matches!(
            store.open(AccountId::new(1), Money::ZERO).await,
            Err(PaymentError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_apply_delta() {
        let store = InMemoryBalanceStore::new();
        store
            .open(AccountId::new(1), Money::new(dec!(10.00)))
            .await
            .unwrap();

        let after = store
            .apply_delta(AccountId::new(1), Money::new(dec!(-2.50)))
            .await
            .unwrap();
        assert_eq!(after.amount, Money::new(dec!(7.50)));

        let missing = store
            .apply_delta(AccountId::new(9), Money::new(dec!(-1)))
            .await;
        assert!(matches!(missing, Err(PaymentError::BalanceNotFound(_))));
    }

    #[tokio::test]
    async fn test_apply_delta_overflow_leaves_balance() {
        let store = InMemoryBalanceStore::new();
        store
            .open(AccountId::new(1), Money::new(rust_decimal::Decimal::MAX))
            .await
            .unwrap();

        let result = store
            .apply_delta(AccountId::new(1), Money::new(dec!(1)))
            .await;
        assert!(matches!(result, Err(PaymentError::ValidationError(_))));

        let stored = store.get_balance(AccountId::new(1)).await.unwrap().unwrap();
        assert_eq!(stored.amount, Money::new(rust_decimal::Decimal::MAX));
    }

    #[tokio::test]
    async fn test_all_balances_sorted_by_account() {
        let store = InMemoryBalanceStore::new();
        for id in [3, 1, 2] {
            store.open(AccountId::new(id), Money::ZERO).await.unwrap();
        }
        let accounts: Vec<u64> = store
            .all_balances()
            .await
            .unwrap()
            .iter()
            .map(|b| b.account_id.value())
            .collect();
        assert_eq!(accounts, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_in_memory_payment_store_assigns_ids() {
        let store = InMemoryPaymentStore::new();
        let price = Price::new(dec!(1.00)).unwrap();

        let first = store
            .save(Payment::success(AccountId::new(1), price, "a"))
            .await
            .unwrap();
        let second = store
            .save(Payment::success(AccountId::new(1), price, "b"))
            .await
            .unwrap();

        assert_eq!(first.id, Some(PaymentId::new(1)));
        assert_eq!(second.id, Some(PaymentId::new(2)));
        assert_eq!(store.all_payments().await.unwrap(), vec![first, second]);
    }
}
