//! Application layer containing the payment use cases.
//!
//! `PaymentCreateUseCase` is the entry point: it serializes payments per
//! account through the lock port and drives the balance use cases.

pub mod balance;
pub mod payment;
