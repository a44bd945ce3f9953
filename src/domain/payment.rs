use super::ids::{AccountId, PaymentId};
use super::money::Price;
use crate::error::PaymentError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentState {
    #[default]
    Pending,
    Success,
    Failed,
}

/// A recorded debit against an account.
///
/// `id` stays `None` until the payment store assigns an identity.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Payment {
    pub id: Option<PaymentId>,
    pub account_id: AccountId,
    pub price: Price,
    pub reference_code: String,
    pub state: PaymentState,
}

impl Payment {
    /// A not yet persisted payment in state `Success`.
    pub fn success(account_id: AccountId, price: Price, reference_code: impl Into<String>) -> Self {
        Self {
            id: None,
            account_id,
            price,
            reference_code: reference_code.into(),
            state: PaymentState::Success,
        }
    }

    pub fn with_id(mut self, id: PaymentId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Request to create a payment for an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCreate {
    pub account_id: AccountId,
    pub price: Price,
    pub reference_code: String,
}

impl PaymentCreate {
    pub fn new(
        account_id: AccountId,
        price: Price,
        reference_code: impl Into<String>,
    ) -> Result<Self, PaymentError> {
        let reference_code = reference_code.into();
        if reference_code.trim().is_empty() {
            return Err(PaymentError::ValidationError(
                "Reference code must not be empty".to_string(),
            ));
        }
        Ok(Self {
            account_id,
            price,
            reference_code,
        })
    }
}
