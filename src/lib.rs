//! Concurrency-safe payment creation.
//!
//! A payment debits an account's balance only if the balance covers the
//! price. The check and the debit run under a per-account lock so that
//! concurrent payments against one account are serialized.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
