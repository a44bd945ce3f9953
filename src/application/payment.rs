use super::balance::{BalanceRetrieveUseCase, BalanceTransactionUseCase};
use crate::domain::ids::AccountId;
use crate::domain::payment::{Payment, PaymentCreate};
use crate::domain::ports::{BalancePortRef, LockPortRef, PaymentPortRef};
use crate::domain::validator::BalanceValidator;
use crate::error::{PaymentError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Creates payments against account balances.
///
/// Each invocation holds the account lock across the whole
/// retrieve/validate/debit/persist sequence, so two payments for the same
/// account never compute their debit from the same balance snapshot.
#[derive(Clone)]
pub struct PaymentCreateUseCase {
    lock: LockPortRef,
    payments: PaymentPortRef,
    balance_retrieve: BalanceRetrieveUseCase,
    balance_transaction: BalanceTransactionUseCase,
    validator: BalanceValidator,
    lock_timeout: Option<Duration>,
}

impl PaymentCreateUseCase {
    /// Creates a new `PaymentCreateUseCase` instance.
    ///
    /// # Arguments
    ///
    /// * `lock` - Per-account mutual exclusion.
    /// * `balances` - The balance store, shared by the balance use cases.
    /// * `payments` - The store successful payments are saved to.
    pub fn new(lock: LockPortRef, balances: BalancePortRef, payments: PaymentPortRef) -> Self {
        Self {
            lock,
            payments,
            balance_retrieve: BalanceRetrieveUseCase::new(balances.clone()),
            balance_transaction: BalanceTransactionUseCase::new(balances),
            validator: BalanceValidator::new(),
            lock_timeout: None,
        }
    }

    /// Bounds how long a flow waits for the account lock.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Debits the account by `cmd.price` and records a successful payment.
    ///
    /// Fails with `BalanceNotSufficient` (key `paymentapi.balance.notSufficient`)
    /// when the balance does not cover the price; nothing is written in that
    /// case. The account lock is released before this returns, whatever the
    /// outcome.
    pub async fn handle(&self, cmd: PaymentCreate) -> Result<Payment> {
        let span = info_span!(
            "payment_create",
            account_id = %cmd.account_id,
            reference_code = %cmd.reference_code,
        );
        async move {
            let lease = self.acquire(cmd.account_id).await?;
            let outcome = self.create_locked(&cmd).await;
            if let Err(e) = lease.release().await {
                error!(error = %e, "Failed to release account lock");
            }

            match &outcome {
                Ok(payment) => info!(payment_id = ?payment.id, price = %cmd.price, "Payment created"),
                Err(e) if e.is_business() => info!(key = e.key(), "Payment rejected"),
                Err(e) => warn!(key = e.key(), error = %e, "Payment aborted"),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn acquire(&self, account_id: AccountId) -> Result<AccountLease> {
        match self.lock_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.lock.lock(account_id))
                .await
                .map_err(|_| PaymentError::LockTimeout {
                    account_id,
                    timeout,
                })??,
            None => self.lock.lock(account_id).await?,
        }
        Ok(AccountLease::new(self.lock.clone(), account_id))
    }

    async fn create_locked(&self, cmd: &PaymentCreate) -> Result<Payment> {
        let balance = self.balance_retrieve.retrieve(cmd.account_id).await?;
        self.validator.validate(cmd.price, &balance)?;

        let balance = self
            .balance_transaction
            .debit(cmd.account_id, cmd.price)
            .await?;
        debug!(balance = %balance.amount, "Balance debited");

        let payment = Payment::success(cmd.account_id, cmd.price, cmd.reference_code.clone());
        self.payments.save(payment).await
    }
}

/// An acquired account lock.
///
/// `release` unlocks on the normal path. A lease dropped while still held
/// (cancelled task, panic) schedules the unlock on the current runtime.
struct AccountLease {
    lock: LockPortRef,
    account_id: AccountId,
    held: bool,
}

impl AccountLease {
    fn new(lock: LockPortRef, account_id: AccountId) -> Self {
        Self {
            lock,
            account_id,
            held: true,
        }
    }

    async fn release(mut self) -> Result<()> {
        let result = self.lock.unlock(self.account_id).await;
        self.held = false;
        result
    }
}

impl Drop for AccountLease {
    fn drop(&mut self) {
        if !self.held {
            return;
        }
        let account_id = self.account_id;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(%account_id, "Account lock dropped while held, releasing");
                let lock = Arc::clone(&self.lock);
                handle.spawn(async move {
                    if let Err(e) = lock.unlock(account_id).await {
                        error!(%account_id, error = %e, "Failed to release dropped account lock");
                    }
                });
            }
            Err(_) => {
                error!(%account_id, "Account lock dropped outside a runtime and was not released");
            }
        }
    }
}
