use crate::domain::ids::AccountId;
use crate::domain::money::Price;
use crate::domain::payment::PaymentCreate;
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One raw request row, before price and reference validation.
#[derive(Debug, Deserialize)]
pub struct PaymentRequestRow {
    pub account: AccountId,
    pub price: Decimal,
    pub reference: String,
}

impl TryFrom<PaymentRequestRow> for PaymentCreate {
    type Error = PaymentError;

    fn try_from(row: PaymentRequestRow) -> Result<Self> {
        PaymentCreate::new(row.account, Price::new(row.price)?, row.reference)
    }
}

/// Reads payment requests (`account, price, reference`) from a CSV source.
///
/// Rows are deserialized lazily, so large request files are streamed.
pub struct PaymentRequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> PaymentRequestReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn requests(self) -> impl Iterator<Item = Result<PaymentCreate>> {
        self.reader.into_deserialize().map(|result| {
            let row: PaymentRequestRow = result.map_err(PaymentError::from)?;
            PaymentCreate::try_from(row)
        })
    }
}
