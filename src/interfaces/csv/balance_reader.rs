use crate::domain::ids::AccountId;
use crate::domain::money::Money;
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One opening balance row: `account, amount`.
#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
pub struct OpeningBalance {
    pub account: AccountId,
    pub amount: Decimal,
}

impl OpeningBalance {
    pub fn money(&self) -> Money {
        Money::new(self.amount)
    }
}

/// Reads opening balances from a CSV source.
pub struct BalanceReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> BalanceReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Negative opening amounts are rejected per row.
    pub fn balances(self) -> impl Iterator<Item = Result<OpeningBalance>> {
        self.reader.into_deserialize().map(|result| {
            let row: OpeningBalance = result.map_err(PaymentError::from)?;
            if row.money().is_negative() {
                return Err(PaymentError::ValidationError(format!(
                    "Opening balance for account {} is negative",
                    row.account
                )));
            }
            Ok(row)
        })
    }
}
