use crate::domain::ids::AccountId;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

/// Stable key for the insufficient balance rejection.
pub const BALANCE_NOT_SUFFICIENT_KEY: &str = "paymentapi.balance.notSufficient";
pub const BALANCE_NOT_FOUND_KEY: &str = "paymentapi.balance.notFound";
pub const LOCK_TIMEOUT_KEY: &str = "paymentapi.lock.timeout";
pub const LOCK_FAILED_KEY: &str = "paymentapi.lock.failed";
pub const VALIDATION_KEY: &str = "paymentapi.request.invalid";
pub const INTERNAL_KEY: &str = "paymentapi.internal";

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Balance not sufficient for account {account_id}: price {price}, available {available}")]
    BalanceNotSufficient {
        account_id: AccountId,
        price: Decimal,
        available: Decimal,
    },
    #[error("Balance not found for account {0}")]
    BalanceNotFound(AccountId),
    #[error("Timed out after {timeout:?} waiting for lock on account {account_id}")]
    LockTimeout {
        account_id: AccountId,
        timeout: Duration,
    },
    #[error("Lock error: {0}")]
    LockError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDBError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl PaymentError {
    /// Machine-readable key for caller-side handling and localization.
    pub fn key(&self) -> &'static str {
        match self {
            Self::BalanceNotSufficient { .. } => BALANCE_NOT_SUFFICIENT_KEY,
            Self::BalanceNotFound(_) => BALANCE_NOT_FOUND_KEY,
            Self::LockTimeout { .. } => LOCK_TIMEOUT_KEY,
            Self::LockError(_) => LOCK_FAILED_KEY,
            Self::ValidationError(_) | Self::CsvError(_) => VALIDATION_KEY,
            _ => INTERNAL_KEY,
        }
    }

    /// Returns true for expected rejections the caller can recover from.
    pub fn is_business(&self) -> bool {
        matches!(self, Self::BalanceNotSufficient { .. })
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
