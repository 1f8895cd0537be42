//! Budget error types.

use thiserror::Error;
use walletwise_shared::AppError;
use walletwise_shared::types::BudgetId;

/// Budget-related errors.
///
/// Only the write path produces these. Status computation never fails.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// Budget not found.
    #[error("Budget not found: {0}")]
    NotFound(BudgetId),

    /// Cap must be strictly positive.
    #[error("Budget amount must be greater than zero")]
    NonPositiveAmount,

    /// Only custom budgets carry an end date.
    #[error("End date is only allowed for custom budgets")]
    EndDateNotAllowed,

    /// Custom window ends before it starts.
    #[error("End date is before start date")]
    EndBeforeStart,

    /// Backing store failure.
    #[error("Budget store error: {0}")]
    Store(String),
}

impl From<BudgetError> for AppError {
    fn from(err: BudgetError) -> Self {
        match err {
            BudgetError::NotFound(_) => Self::NotFound(err.to_string()),
            BudgetError::NonPositiveAmount
            | BudgetError::EndDateNotAllowed
            | BudgetError::EndBeforeStart => Self::Validation(err.to_string()),
            BudgetError::Store(msg) => Self::Store(msg),
        }
    }
}
