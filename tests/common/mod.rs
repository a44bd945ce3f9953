#![allow(dead_code)]

use payment_core::application::payment::PaymentCreateUseCase;
use payment_core::domain::ids::AccountId;
use payment_core::domain::money::{Money, Price};
use payment_core::domain::payment::PaymentCreate;
use payment_core::domain::ports::{BalancePort, LockPortRef};
use payment_core::infrastructure::in_memory::{InMemoryBalanceStore, InMemoryPaymentStore};
use payment_core::infrastructure::lock::InMemoryAccountLock;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{Error, Write};
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;

pub struct Harness {
    pub balances: Arc<InMemoryBalanceStore>,
    pub payments: Arc<InMemoryPaymentStore>,
    pub use_case: PaymentCreateUseCase,
}

/// In-memory stores seeded with `(account, amount)` pairs behind `lock`.
pub async fn harness_with_lock(opening: &[(u64, Decimal)], lock: LockPortRef) -> Harness {
    let balances = Arc::new(InMemoryBalanceStore::new());
    for (account, amount) in opening {
        balances
            .open(AccountId::new(*account), Money::new(*amount))
            .await
            .unwrap();
    }
    let payments = Arc::new(InMemoryPaymentStore::new());
    let use_case = PaymentCreateUseCase::new(lock, balances.clone(), payments.clone());
    Harness {
        balances,
        payments,
        use_case,
    }
}

pub async fn harness(opening: &[(u64, Decimal)]) -> Harness {
    harness_with_lock(opening, Arc::new(InMemoryAccountLock::new())).await
}

pub fn request(account: u64, price: Decimal, reference: &str) -> PaymentCreate {
    PaymentCreate::new(AccountId::new(account), Price::new(price).unwrap(), reference).unwrap()
}

pub async fn amount(balances: &InMemoryBalanceStore, account: u64) -> Decimal {
    balances
        .get_balance(AccountId::new(account))
        .await
        .unwrap()
        .expect("balance should exist")
        .amount
        .value()
}

pub fn csv_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

/// Writes `rows` payment requests of `1.0` spread over `accounts` accounts.
pub fn generate_requests(path: &Path, rows: usize, accounts: u64) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["account", "price", "reference"])?;
    for i in 0..rows {
        let account = (i as u64 % accounts) + 1;
        wtr.write_record([account.to_string(), "1.0".to_string(), format!("ref{i}")])?;
    }

    wtr.flush()?;
    Ok(())
}
