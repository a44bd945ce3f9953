use crate::domain::balance::{Balance, BalanceTransaction};
use crate::domain::ids::{AccountId, BalanceId, PaymentId};
use crate::domain::money::Money;
use crate::domain::payment::Payment;
use crate::domain::ports::{BalancePort, PaymentPort};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Column Family for storing balance snapshots, keyed by account.
pub const CF_BALANCES: &str = "balances";
/// Column Family for storing payments, keyed by payment id.
pub const CF_PAYMENTS: &str = "payments";

/// A persistent store implementation using RocksDB.
///
/// Handles storage for both `Balance` and `Payment` entities using separate
/// Column Families. Writes go through a single async gate so that the
/// read-modify-write of `apply_delta` and id assignment are atomic.
/// The number of stored balances is counted once on open and kept in memory.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_gate: Arc<Mutex<()>>,
    balance_count: Arc<AtomicU64>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("balances" and "payments") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_balances = ColumnFamilyDescriptor::new(CF_BALANCES, Options::default());
        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_balances, cf_payments])?;

        let store = Self {
            db: Arc::new(db),
            write_gate: Arc::new(Mutex::new(())),
            balance_count: Arc::new(AtomicU64::new(0)),
        };
        store
            .balance_count
            .store(store.count(CF_BALANCES)?, Ordering::Release);
        Ok(store)
    }

    /// Opens the balance of a new account. An account already present keeps
    /// its stored balance, which is returned unchanged.
    pub async fn open_balance(&self, account_id: AccountId, amount: Money) -> Result<Balance> {
        let _gate = self.write_gate.lock().await;
        if let Some(existing) = self.read::<Balance>(CF_BALANCES, &account_id.value().to_be_bytes())? {
            return Ok(existing);
        }
        let id = BalanceId::new(self.balance_count.load(Ordering::Acquire) + 1);
        let balance = Balance::new(id, account_id, amount);
        self.write(CF_BALANCES, &account_id.value().to_be_bytes(), &balance)?;
        self.balance_count.store(id.value(), Ordering::Release);
        Ok(balance)
    }

    pub fn all_balances(&self) -> Result<Vec<Balance>> {
        self.scan(CF_BALANCES)
    }

    pub fn all_payments(&self) -> Result<Vec<Payment>> {
        self.scan(CF_PAYMENTS)
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PaymentError::InternalError(Box::new(std::io::Error::other(format!(
                "Column family {name} not found"
            ))))
        })
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes).map_err(|e| {
                    PaymentError::InternalError(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("Deserialization error: {}", e),
                    )))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value).map_err(|e| {
            PaymentError::InternalError(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Serialization error: {}", e),
            )))
        })?;
        self.db.put_cf(cf, key, bytes)?;
        Ok(())
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, bytes) = item?;
            let value = serde_json::from_slice(&bytes).map_err(|e| {
                PaymentError::InternalError(Box::new(std::io::Error::other(format!(
                    "Failed to deserialize {cf_name} entry: {}",
                    e
                ))))
            })?;
            values.push(value);
        }
        Ok(values)
    }

    fn count(&self, cf_name: &str) -> Result<u64> {
        let cf = self.cf(cf_name)?;
        let mut count = 0;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    fn last_payment_id(&self) -> Result<u64> {
        let cf = self.cf(CF_PAYMENTS)?;
        match self.db.iterator_cf(cf, IteratorMode::End).next() {
            Some(item) => {
                let (key, _) = item?;
                let bytes: [u8; 8] = key.as_ref().try_into().map_err(|_| {
                    PaymentError::InternalError(Box::new(std::io::Error::other(
                        "Malformed payment key",
                    )))
                })?;
                Ok(u64::from_be_bytes(bytes))
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl BalancePort for RocksDBStore {
    async fn get_balance(&self, account_id: AccountId) -> Result<Option<Balance>> {
        self.read(CF_BALANCES, &account_id.value().to_be_bytes())
    }

    async fn apply_delta(&self, account_id: AccountId, amount: Money) -> Result<Balance> {
        let _gate = self.write_gate.lock().await;
        let key = account_id.value().to_be_bytes();
        let current: Balance = self
            .read(CF_BALANCES, &key)?
            .ok_or(PaymentError::BalanceNotFound(account_id))?;
        let balance = current.apply(&BalanceTransaction::new(account_id, amount))?;
        self.write(CF_BALANCES, &key, &balance)?;
        Ok(balance)
    }
}

#[async_trait]
impl PaymentPort for RocksDBStore {
    async fn save(&self, payment: Payment) -> Result<Payment> {
        let _gate = self.write_gate.lock().await;
        let id = self.last_payment_id()? + 1;
        let saved = payment.with_id(PaymentId::new(id));
        self.write(CF_PAYMENTS, &id.to_be_bytes(), &saved)?;
        Ok(saved)
    }
}
