use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use payment_core::application::payment::PaymentCreateUseCase;
use payment_core::domain::balance::Balance;
use payment_core::domain::ids::AccountId;
use payment_core::domain::money::Money;
use payment_core::domain::payment::Payment;
use payment_core::domain::ports::{BalancePortRef, LockPortRef, PaymentPortRef};
use payment_core::infrastructure::in_memory::{InMemoryBalanceStore, InMemoryPaymentStore};
use payment_core::infrastructure::lock::InMemoryAccountLock;
#[cfg(feature = "storage-rocksdb")]
use payment_core::infrastructure::rocksdb::RocksDBStore;
use payment_core::interfaces::csv::balance_reader::BalanceReader;
use payment_core::interfaces::csv::payment_reader::PaymentRequestReader;
use payment_core::interfaces::csv::report_writer::ReportWriter;
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Report {
    Balances,
    Payments,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Opening balances CSV file (account, amount)
    balances: PathBuf,

    /// Payment requests CSV file (account, price, reference)
    payments: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Give up waiting for an account lock after this many milliseconds.
    #[arg(long, env = "PAYMENT_LOCK_TIMEOUT_MS")]
    lock_timeout_ms: Option<u64>,

    /// What to print on stdout once all payments are processed.
    #[arg(long, value_enum, default_value_t = Report::Balances)]
    report: Report,
}

enum Storage {
    InMemory {
        balances: Arc<InMemoryBalanceStore>,
        payments: Arc<InMemoryPaymentStore>,
    },
    #[cfg(feature = "storage-rocksdb")]
    RocksDB(Arc<RocksDBStore>),
}

impl Storage {
    fn in_memory() -> Self {
        Self::InMemory {
            balances: Arc::new(InMemoryBalanceStore::new()),
            payments: Arc::new(InMemoryPaymentStore::new()),
        }
    }

    #[cfg(feature = "storage-rocksdb")]
    fn open(db_path: Option<PathBuf>) -> Result<Self> {
        match db_path {
            Some(path) => Ok(Self::RocksDB(Arc::new(
                RocksDBStore::open(path).into_diagnostic()?,
            ))),
            None => Ok(Self::in_memory()),
        }
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    fn open(db_path: Option<PathBuf>) -> Result<Self> {
        if db_path.is_some() {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
        }
        Ok(Self::in_memory())
    }

    fn ports(&self) -> (BalancePortRef, PaymentPortRef) {
        match self {
            Self::InMemory { balances, payments } => (balances.clone(), payments.clone()),
            #[cfg(feature = "storage-rocksdb")]
            Self::RocksDB(store) => (store.clone(), store.clone()),
        }
    }

    async fn open_balance(&self, account_id: AccountId, amount: Money) -> Result<Balance> {
        match self {
            Self::InMemory { balances, .. } => balances.open(account_id, amount).await.into_diagnostic(),
            #[cfg(feature = "storage-rocksdb")]
            Self::RocksDB(store) => store.open_balance(account_id, amount).await.into_diagnostic(),
        }
    }

    async fn balances(&self) -> Result<Vec<Balance>> {
        match self {
            Self::InMemory { balances, .. } => balances.all_balances().await.into_diagnostic(),
            #[cfg(feature = "storage-rocksdb")]
            Self::RocksDB(store) => store.all_balances().into_diagnostic(),
        }
    }

    async fn payments(&self) -> Result<Vec<Payment>> {
        match self {
            Self::InMemory { payments, .. } => payments.all_payments().await.into_diagnostic(),
            #[cfg(feature = "storage-rocksdb")]
            Self::RocksDB(store) => store.all_payments().into_diagnostic(),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .try_init()
    {
        eprintln!("tracing init failed: {e}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let storage = Storage::open(cli.db_path)?;

    // Seed opening balances
    let file = File::open(&cli.balances).into_diagnostic()?;
    for row in BalanceReader::new(file).balances() {
        match row {
            Ok(row) => {
                if let Err(e) = storage.open_balance(row.account, row.money()).await {
                    warn!(account_id = %row.account, error = %e, "Error opening balance");
                }
            }
            Err(e) => warn!(error = %e, "Error reading balance"),
        }
    }

    let (balances, payments) = storage.ports();
    let lock: LockPortRef = Arc::new(InMemoryAccountLock::new());
    let mut use_case = PaymentCreateUseCase::new(lock, balances, payments);
    if let Some(ms) = cli.lock_timeout_ms {
        use_case = use_case.with_lock_timeout(Duration::from_millis(ms));
    }

    // Submit every request concurrently; the account lock serializes per account.
    let file = File::open(&cli.payments).into_diagnostic()?;
    let mut tasks = JoinSet::new();
    for request in PaymentRequestReader::new(file).requests() {
        match request {
            Ok(cmd) => {
                let use_case = use_case.clone();
                tasks.spawn(async move {
                    let reference = cmd.reference_code.clone();
                    (reference, use_case.handle(cmd).await)
                });
            }
            Err(e) => warn!(error = %e, "Error reading payment request"),
        }
    }

    let (mut created, mut rejected) = (0usize, 0usize);
    while let Some(joined) = tasks.join_next().await {
        let (reference, outcome) = joined.into_diagnostic()?;
        match outcome {
            Ok(_) => created += 1,
            Err(e) => {
                rejected += 1;
                warn!(reference = %reference, key = e.key(), error = %e, "Payment rejected");
            }
        }
    }
    info!(created, rejected, "Processed payment requests");

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    let written = match cli.report {
        Report::Balances => writer.write_balances(storage.balances().await?),
        Report::Payments => writer.write_payments(storage.payments().await?),
    };
    written.into_diagnostic()?;

    Ok(())
}
