//! In-memory reactive store for Walletwise.
//!
//! This crate provides:
//! - Budget storage with a live stream of the active budget set
//! - Accounts (wallets) with running balances
//! - Income/expense transactions and live per-category spend totals
//!
//! [`MemoryStore`] implements the budget source, spend source and budget store
//! contracts of `walletwise_core::budget::source`.

pub mod error;
pub mod memory;
pub mod models;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use models::{Account, Transaction, TransactionKind};
