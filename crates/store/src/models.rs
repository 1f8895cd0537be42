//! Account and transaction records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use walletwise_shared::types::{AccountId, CategoryId, TransactionId};

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money coming into the account.
    Income,
    /// Money leaving the account. Only expenses count as budget spend.
    Expense,
}

/// An account (wallet) with its running balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Current balance.
    pub balance: Decimal,
}

/// A categorized income or expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Account the money moved in or out of.
    pub account_id: AccountId,
    /// Spending or income category.
    pub category_id: CategoryId,
    /// Unsigned amount.
    pub amount: Decimal,
    /// Income or expense.
    pub kind: TransactionKind,
    /// When it happened.
    pub date: DateTime<Utc>,
    /// Optional note.
    pub note: Option<String>,
}

impl Transaction {
    /// Creates an expense with a fresh ID.
    #[must_use]
    pub fn expense(
        account_id: AccountId,
        category_id: CategoryId,
        amount: Decimal,
        date: DateTime<Utc>,
    ) -> Self {
        Self::new(account_id, category_id, amount, TransactionKind::Expense, date)
    }

    /// Creates an income with a fresh ID.
    #[must_use]
    pub fn income(
        account_id: AccountId,
        category_id: CategoryId,
        amount: Decimal,
        date: DateTime<Utc>,
    ) -> Self {
        Self::new(account_id, category_id, amount, TransactionKind::Income, date)
    }

    fn new(
        account_id: AccountId,
        category_id: CategoryId,
        amount: Decimal,
        kind: TransactionKind,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            account_id,
            category_id,
            amount,
            kind,
            date,
            note: None,
        }
    }

    /// Effect on the account balance: positive for income, negative for expense.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}
