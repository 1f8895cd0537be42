//! Store backed by a single `watch` channel.
//!
//! Every write replaces the snapshot through `send_if_modified`; readers derive
//! their streams from snapshot changes and suppress repeats.

use std::collections::HashMap;
use std::future;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, info};
use walletwise_core::budget::{
    Budget, BudgetError, BudgetSource, BudgetStore, ResolvedPeriod, SpendSource, watch_map,
};
use walletwise_shared::types::{AccountId, BudgetId, CategoryId, TransactionId};

use crate::error::StoreError;
use crate::models::{Account, Transaction, TransactionKind};

#[derive(Debug, Default)]
struct Snapshot {
    budgets: Vec<Budget>,
    accounts: HashMap<AccountId, Account>,
    transactions: HashMap<TransactionId, Transaction>,
}

impl Snapshot {
    fn spent(&self, category_id: CategoryId, period: &ResolvedPeriod) -> Decimal {
        self.transactions
            .values()
            .filter(|tx| {
                tx.kind == TransactionKind::Expense
                    && tx.category_id == category_id
                    && period.contains(tx.date)
            })
            .map(|tx| tx.amount)
            .sum()
    }

    fn active_budgets(&self) -> Vec<Budget> {
        self.budgets.iter().filter(|b| b.is_active).cloned().collect()
    }
}

/// In-memory store of budgets, accounts and transactions.
#[derive(Debug)]
pub struct MemoryStore {
    state: watch::Sender<Snapshot>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(Snapshot::default()),
        }
    }

    /// Opens an account with an opening balance.
    pub fn create_account(&self, name: impl Into<String>, opening_balance: Decimal) -> Account {
        let account = Account {
            id: AccountId::new(),
            name: name.into(),
            balance: opening_balance,
        };
        self.state.send_modify(|s| {
            s.accounts.insert(account.id, account.clone());
        });
        info!(account_id = %account.id, "account created");
        account
    }

    /// Looks up an account.
    pub fn account(&self, id: AccountId) -> Option<Account> {
        self.state.borrow().accounts.get(&id).cloned()
    }

    /// All accounts, ordered by name.
    pub fn accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.state.borrow().accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        accounts
    }

    /// Inserts or replaces a transaction and moves the account balance.
    ///
    /// Replacing a transaction first reverses its previous effect, so editing
    /// the amount, kind or account keeps every balance consistent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NonPositiveAmount` for a zero or negative amount and
    /// `StoreError::AccountNotFound` if the account does not exist.
    pub fn save_transaction(&self, tx: Transaction) -> Result<(), StoreError> {
        if tx.amount <= Decimal::ZERO {
            return Err(StoreError::NonPositiveAmount);
        }

        let id = tx.id;
        let mut result = Ok(());
        self.state.send_if_modified(|s| {
            if !s.accounts.contains_key(&tx.account_id) {
                result = Err(StoreError::AccountNotFound(tx.account_id));
                return false;
            }
            if let Some(old) = s.transactions.get(&tx.id) {
                if let Some(account) = s.accounts.get_mut(&old.account_id) {
                    account.balance -= old.signed_amount();
                }
            }
            if let Some(account) = s.accounts.get_mut(&tx.account_id) {
                account.balance += tx.signed_amount();
            }
            s.transactions.insert(tx.id, tx);
            true
        });

        if result.is_ok() {
            debug!(transaction_id = %id, "transaction saved");
        }
        result
    }

    /// Removes a transaction and reverses its effect on the account balance.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TransactionNotFound` if no such transaction exists.
    pub fn delete_transaction(&self, id: TransactionId) -> Result<Transaction, StoreError> {
        let mut removed = None;
        self.state.send_if_modified(|s| {
            let Some(tx) = s.transactions.remove(&id) else {
                return false;
            };
            if let Some(account) = s.accounts.get_mut(&tx.account_id) {
                account.balance -= tx.signed_amount();
            }
            removed = Some(tx);
            true
        });

        let tx = removed.ok_or(StoreError::TransactionNotFound(id))?;
        debug!(transaction_id = %id, "transaction deleted");
        Ok(tx)
    }

    /// Looks up a transaction.
    pub fn transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.state.borrow().transactions.get(&id).cloned()
    }

    /// Current expense total for a category inside a window.
    pub fn spent_in(&self, category_id: CategoryId, period: &ResolvedPeriod) -> Decimal {
        self.state.borrow().spent(category_id, period)
    }

    /// Inserts or replaces a budget. A new budget goes to the end of the list;
    /// a replaced one keeps its position.
    pub fn put_budget(&self, budget: Budget) {
        let id = budget.id;
        self.state.send_modify(|s| {
            match s.budgets.iter_mut().find(|b| b.id == budget.id) {
                Some(existing) => *existing = budget,
                None => s.budgets.push(budget),
            }
        });
        info!(budget_id = %id, "budget stored");
    }

    /// Removes a budget.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BudgetNotFound` if no such budget exists.
    pub fn take_budget(&self, id: BudgetId) -> Result<Budget, StoreError> {
        let mut removed = None;
        self.state.send_if_modified(|s| {
            let Some(index) = s.budgets.iter().position(|b| b.id == id) else {
                return false;
            };
            removed = Some(s.budgets.remove(index));
            true
        });

        let budget = removed.ok_or(StoreError::BudgetNotFound(id))?;
        info!(budget_id = %id, "budget removed");
        Ok(budget)
    }

    /// Looks up a budget.
    pub fn budget(&self, id: BudgetId) -> Option<Budget> {
        self.state.borrow().budgets.iter().find(|b| b.id == id).cloned()
    }

    /// All budgets, active or not, in insertion order.
    pub fn budgets(&self) -> Vec<Budget> {
        self.state.borrow().budgets.clone()
    }
}

/// Drops items equal to the one emitted just before.
fn distinct<T>(items: BoxStream<'static, T>) -> BoxStream<'static, T>
where
    T: PartialEq + Clone + Send + 'static,
{
    let mut last: Option<T> = None;
    items
        .filter(move |item| {
            let changed = last.as_ref() != Some(item);
            if changed {
                last = Some(item.clone());
            }
            future::ready(changed)
        })
        .boxed()
}

impl BudgetSource for MemoryStore {
    fn active_budgets(&self) -> BoxStream<'static, Vec<Budget>> {
        distinct(watch_map(self.state.subscribe(), Snapshot::active_budgets))
    }
}

impl SpendSource for MemoryStore {
    fn spent_amount(
        &self,
        category_id: CategoryId,
        period: &ResolvedPeriod,
    ) -> BoxStream<'static, Decimal> {
        let period = *period;
        distinct(watch_map(self.state.subscribe(), move |s: &Snapshot| {
            s.spent(category_id, &period)
        }))
    }
}

#[async_trait]
impl BudgetStore for MemoryStore {
    async fn upsert_budget(&self, budget: Budget) -> Result<(), BudgetError> {
        self.put_budget(budget);
        Ok(())
    }

    async fn remove_budget(&self, id: BudgetId) -> Result<(), BudgetError> {
        self.take_budget(id)?;
        Ok(())
    }
}
