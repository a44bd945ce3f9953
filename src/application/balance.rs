use crate::domain::balance::{Balance, BalanceTransaction};
use crate::domain::ids::AccountId;
use crate::domain::money::Price;
use crate::domain::ports::BalancePortRef;
use crate::error::{PaymentError, Result};
use tracing::debug;

/// Read-through access to an account's current balance.
#[derive(Clone)]
pub struct BalanceRetrieveUseCase {
    balances: BalancePortRef,
}

impl BalanceRetrieveUseCase {
    pub fn new(balances: BalancePortRef) -> Self {
        Self { balances }
    }

    /// Fails with `BalanceNotFound` when the account has no balance.
    pub async fn retrieve(&self, account_id: AccountId) -> Result<Balance> {
        self.balances
            .get_balance(account_id)
            .await?
            .ok_or(PaymentError::BalanceNotFound(account_id))
    }
}

/// Applies balance transactions through the balance store.
///
/// Callers must hold the account lock and have validated the debit; the
/// resulting snapshot is not re-validated.
#[derive(Clone)]
pub struct BalanceTransactionUseCase {
    balances: BalancePortRef,
}

impl BalanceTransactionUseCase {
    pub fn new(balances: BalancePortRef) -> Self {
        Self { balances }
    }

    pub async fn debit(&self, account_id: AccountId, price: Price) -> Result<Balance> {
        self.apply(BalanceTransaction::debit(account_id, price)).await
    }

    pub async fn apply(&self, tx: BalanceTransaction) -> Result<Balance> {
        let balance = self.balances.apply_delta(tx.account_id, tx.amount).await?;
        debug!(
            account_id = %tx.account_id,
            delta = %tx.amount,
            balance = %balance.amount,
            "Applied balance transaction"
        );
        Ok(balance)
    }
}
