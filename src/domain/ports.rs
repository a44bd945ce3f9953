use super::balance::Balance;
use super::ids::AccountId;
use super::money::Money;
use super::payment::Payment;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Per-account mutual exclusion.
///
/// While one flow holds the lock for an account, `lock` for the same account
/// does not return in any other flow until `unlock` is called. Distinct
/// accounts never contend.
#[async_trait]
pub trait LockPort: Send + Sync {
    async fn lock(&self, account_id: AccountId) -> Result<()>;
    async fn unlock(&self, account_id: AccountId) -> Result<()>;
}

/// Source of truth for account balances.
#[async_trait]
pub trait BalancePort: Send + Sync {
    async fn get_balance(&self, account_id: AccountId) -> Result<Option<Balance>>;
    /// Atomically adds `amount` (signed) to the balance and returns the new snapshot.
    async fn apply_delta(&self, account_id: AccountId, amount: Money) -> Result<Balance>;
}

#[async_trait]
pub trait PaymentPort: Send + Sync {
    /// Persists the payment and returns it with its identity assigned.
    async fn save(&self, payment: Payment) -> Result<Payment>;
}

pub type LockPortRef = Arc<dyn LockPort>;
pub type BalancePortRef = Arc<dyn BalancePort>;
pub type PaymentPortRef = Arc<dyn PaymentPort>;
