//! Store error types.

use thiserror::Error;
use walletwise_core::budget::BudgetError;
use walletwise_shared::AppError;
use walletwise_shared::types::{AccountId, BudgetId, TransactionId};

/// Error types for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Budget not found.
    #[error("Budget not found: {0}")]
    BudgetNotFound(BudgetId),

    /// Transaction amounts are unsigned; the kind carries the direction.
    #[error("Transaction amount must be greater than zero")]
    NonPositiveAmount,
}

impl From<StoreError> for BudgetError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BudgetNotFound(id) => Self::NotFound(id),
            other => Self::Store(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccountNotFound(_)
            | StoreError::TransactionNotFound(_)
            | StoreError::BudgetNotFound(_) => Self::NotFound(err.to_string()),
            StoreError::NonPositiveAmount => Self::Validation(err.to_string()),
        }
    }
}
