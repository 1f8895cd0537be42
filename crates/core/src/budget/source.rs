//! Contracts of the collaborators the status engine reads from and writes to.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use rust_decimal::Decimal;
use tokio::sync::watch;
use walletwise_shared::types::{BudgetId, CategoryId};

use super::error::BudgetError;
use super::types::{Budget, ResolvedPeriod};

/// Live set of active budgets.
pub trait BudgetSource: Send + Sync {
    /// Emits the current set immediately, then again after every change that
    /// affects which budgets are active or how they are defined.
    fn active_budgets(&self) -> BoxStream<'static, Vec<Budget>>;
}

/// Live spend totals.
pub trait SpendSource: Send + Sync {
    /// Emits the total expense amount for `category_id` inside `period`,
    /// starting with the current figure. Emits zero when nothing matches.
    fn spent_amount(
        &self,
        category_id: CategoryId,
        period: &ResolvedPeriod,
    ) -> BoxStream<'static, Decimal>;
}

/// Persistent budget storage.
#[async_trait]
pub trait BudgetStore: Send + Sync {
    /// Inserts or replaces a budget.
    async fn upsert_budget(&self, budget: Budget) -> Result<(), BudgetError>;

    /// Deletes a budget.
    async fn remove_budget(&self, id: BudgetId) -> Result<(), BudgetError>;
}

/// Turns a watch receiver into a stream of `f(value)`: the current value
/// first, then one item per observed change. Ends when the sender is dropped.
pub fn watch_map<T, U, F>(rx: watch::Receiver<T>, f: F) -> BoxStream<'static, U>
where
    T: Send + Sync + 'static,
    U: Send + 'static,
    F: FnMut(&T) -> U + Send + 'static,
{
    stream::unfold((rx, f, true), |(mut rx, mut f, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let item = f(&*rx.borrow_and_update());
        Some((item, (rx, f, false)))
    })
    .boxed()
}

/// [`watch_map`] with the identity mapping.
pub fn watch_stream<T>(rx: watch::Receiver<T>) -> BoxStream<'static, T>
where
    T: Clone + Send + Sync + 'static,
{
    watch_map(rx, T::clone)
}
