use crate::domain::balance::Balance;
use crate::domain::ids::{AccountId, PaymentId};
use crate::domain::payment::{Payment, PaymentState};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct BalanceRow {
    account: AccountId,
    amount: Decimal,
}

#[derive(Serialize)]
struct PaymentRow<'a> {
    id: Option<PaymentId>,
    account: AccountId,
    price: Decimal,
    reference: &'a str,
    state: PaymentState,
}

/// Writes the final balances or the saved payments as CSV.
///
/// Amounts are normalized, so `1.00` is written as `1`.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_balances(&mut self, balances: impl IntoIterator<Item = Balance>) -> Result<()> {
        let mut rows = 0;
        for balance in balances {
            self.writer.serialize(BalanceRow {
                account: balance.account_id,
                amount: balance.amount.value().normalize(),
            })?;
            rows += 1;
        }
        if rows == 0 {
            self.writer.write_record(["account", "amount"])?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_payments(&mut self, payments: impl IntoIterator<Item = Payment>) -> Result<()> {
        let mut rows = 0;
        for payment in payments {
            self.writer.serialize(PaymentRow {
                id: payment.id,
                account: payment.account_id,
                price: payment.price.value().normalize(),
                reference: &payment.reference_code,
                state: payment.state,
            })?;
            rows += 1;
        }
        if rows == 0 {
            self.writer
                .write_record(["id", "account", "price", "reference", "state"])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::BalanceId;
    use crate::domain::money::{Money, Price};
    use rust_decimal_macros::dec;

    #[test]
    fn test_write_balances() {
        let mut out = Vec::new();
        ReportWriter::new(&mut out)
            .write_balances(vec![
                Balance::new(BalanceId::new(1), AccountId::new(1), Money::new(dec!(0.00))),
                Balance::new(BalanceId::new(2), AccountId::new(2), Money::new(dec!(1.50))),
            ])
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "account,amount\n1,0\n2,1.5\n");
    }

    #[test]
    fn test_write_payments() {
        let payment = Payment::success(AccountId::new(3), Price::new(dec!(4.50)).unwrap(), "ref1")
            .with_id(PaymentId::new(1));
        let mut out = Vec::new();
        ReportWriter::new(&mut out).write_payments(vec![payment]).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "id,account,price,reference,state\n1,3,4.5,ref1,SUCCESS\n");
    }

    #[test]
    fn test_empty_report_keeps_header() {
        let mut out = Vec::new();
        ReportWriter::new(&mut out).write_balances(Vec::new()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "account,amount\n");
    }
}
