use crate::domain::ids::AccountId;
use crate::domain::ports::LockPort;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

#[derive(Default)]
struct Slots {
    mutexes: HashMap<AccountId, Arc<Mutex<()>>>,
    held: HashMap<AccountId, OwnedMutexGuard<()>>,
}

/// In-process keyed mutex implementing the account lock port.
///
/// Every account gets its own `tokio::sync::Mutex`, created on first use.
/// The guard of a held lock is parked in the registry between `lock` and
/// `unlock`, so the two calls may come from different tasks. Waiters are
/// served in FIFO order.
#[derive(Default, Clone)]
pub struct InMemoryAccountLock {
    slots: Arc<Mutex<Slots>>,
}

impl InMemoryAccountLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_locked(&self, account_id: AccountId) -> bool {
        self.slots.lock().await.held.contains_key(&account_id)
    }

    /// Number of accounts with a live mutex (held or waited on).
    pub async fn tracked_accounts(&self) -> usize {
        self.slots.lock().await.mutexes.len()
    }
}

#[async_trait]
impl LockPort for InMemoryAccountLock {
    async fn lock(&self, account_id: AccountId) -> Result<()> {
        let mutex = {
            let mut slots = self.slots.lock().await;
            slots.mutexes.entry(account_id).or_default().clone()
        };

        // Dropping this future before the guard is parked releases the mutex.
        let guard = mutex.lock_owned().await;

        let mut slots = self.slots.lock().await;
        slots.held.insert(account_id, guard);
        trace!(%account_id, "Account locked");
        Ok(())
    }

    async fn unlock(&self, account_id: AccountId) -> Result<()> {
        let mut slots = self.slots.lock().await;
        let guard = slots.held.remove(&account_id).ok_or_else(|| {
            PaymentError::LockError(format!("Account {account_id} is not locked"))
        })?;
        drop(guard);

        // Only the registry references the mutex: nobody holds or waits on it.
        let idle = slots
            .mutexes
            .get(&account_id)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1);
        if idle {
            slots.mutexes.remove(&account_id);
        }
        trace!(%account_id, "Account unlocked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_second_lock_waits_for_unlock() {
        let lock = InMemoryAccountLock::new();
        let account = AccountId::new(1);
        lock.lock(account).await.unwrap();

        let contender = lock.clone();
        let waiter = tokio::spawn(async move { contender.lock(account).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        lock.unlock(account).await.unwrap();
        timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter was not woken")
            .unwrap()
            .unwrap();
        assert!(lock.is_locked(account).await);
    }

    #[tokio::test]
    async fn test_distinct_accounts_do_not_contend() {
        let lock = InMemoryAccountLock::new();
        lock.lock(AccountId::new(1)).await.unwrap();

        timeout(Duration::from_millis(100), lock.lock(AccountId::new(2)))
            .await
            .expect("lock on another account blocked")
            .unwrap();

        assert!(lock.is_locked(AccountId::new(1)).await);
        assert!(lock.is_locked(AccountId::new(2)).await);
    }

    #[tokio::test]
    async fn test_unlock_without_lock_fails() {
        let lock = InMemoryAccountLock::new();
        assert!(matches!(
            lock.unlock(AccountId::new(1)).await,
            Err(PaymentError::LockError(_))
        ));
    }

    #[tokio::test]
    async fn test_unlock_forgets_idle_accounts() {
        let lock = InMemoryAccountLock::new();
        for id in 1..=10 {
            lock.lock(AccountId::new(id)).await.unwrap();
        }
        assert_eq!(lock.tracked_accounts().await, 10);

        for id in 1..=10 {
            lock.unlock(AccountId::new(id)).await.unwrap();
        }
        assert_eq!(lock.tracked_accounts().await, 0);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_does_not_take_the_lock() {
        let lock = InMemoryAccountLock::new();
        let account = AccountId::new(1);
        lock.lock(account).await.unwrap();

        let timed_out = timeout(Duration::from_millis(20), lock.lock(account)).await;
        assert!(timed_out.is_err());

        lock.unlock(account).await.unwrap();
        assert!(!lock.is_locked(account).await);
        timeout(Duration::from_millis(100), lock.lock(account))
            .await
            .expect("lock stayed taken by cancelled waiter")
            .unwrap();
    }
}
