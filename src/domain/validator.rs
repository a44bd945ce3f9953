use super::balance::Balance;
use super::money::{Money, Price};
use crate::error::{PaymentError, Result};

/// Decides whether a balance covers a requested price.
#[derive(Debug, Default, Clone, Copy)]
pub struct BalanceValidator;

impl BalanceValidator {
    pub fn new() -> Self {
        Self
    }

    /// Sufficient iff the balance amount is at least the price.
    pub fn is_sufficient(&self, price: Price, balance: &Balance) -> bool {
        balance.amount >= Money::from(price)
    }

    pub fn validate(&self, price: Price, balance: &Balance) -> Result<()> {
        if self.is_sufficient(price, balance) {
            Ok(())
        } else {
            Err(PaymentError::BalanceNotSufficient {
                account_id: balance.account_id,
                price: price.value(),
                available: balance.amount.value(),
            })
        }
    }
}
