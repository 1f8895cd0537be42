//! Public entry point: live statuses plus the budget write path.

use std::sync::Arc;

use futures::stream::BoxStream;
use tracing::info;
use walletwise_shared::types::BudgetId;

use super::clock::Clock;
use super::error::BudgetError;
use super::rollover::midnight_ticks;
use super::service::BudgetService;
use super::source::{BudgetSource, BudgetStore, SpendSource};
use super::stream::BudgetStatusStream;
use super::types::Budget;

/// Wires the budget source, spend source, store and clock together.
#[derive(Clone)]
pub struct BudgetTracker {
    budgets: Arc<dyn BudgetSource>,
    spend: Arc<dyn SpendSource>,
    store: Arc<dyn BudgetStore>,
    clock: Arc<dyn Clock>,
    midnight_refresh: bool,
}

impl BudgetTracker {
    /// Creates a tracker without a midnight refresh.
    pub fn new(
        budgets: Arc<dyn BudgetSource>,
        spend: Arc<dyn SpendSource>,
        store: Arc<dyn BudgetStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            budgets,
            spend,
            store,
            clock,
            midnight_refresh: false,
        }
    }

    /// Re-resolves every window at each local midnight of the clock.
    #[must_use]
    pub fn with_midnight_refresh(mut self, enabled: bool) -> Self {
        self.midnight_refresh = enabled;
        self
    }

    /// Live list of statuses for the active budgets.
    ///
    /// Must be called from within a tokio runtime.
    pub fn statuses(&self) -> BudgetStatusStream {
        let refresh = self
            .midnight_refresh
            .then(|| midnight_ticks(Arc::clone(&self.clock)));
        self.statuses_with_refresh(refresh)
    }

    /// Like [`Self::statuses`], with a caller-supplied refresh trigger.
    pub fn statuses_with_refresh(
        &self,
        refresh: Option<BoxStream<'static, ()>>,
    ) -> BudgetStatusStream {
        BudgetStatusStream::spawn(
            self.budgets.active_budgets(),
            Arc::clone(&self.spend),
            Arc::clone(&self.clock),
            refresh,
        )
    }

    /// Validates and stores a budget. The budget source re-emits afterwards.
    ///
    /// # Errors
    ///
    /// Returns a validation error from [`BudgetService::validate_budget`] or a
    /// store error.
    pub async fn save_budget(&self, budget: Budget) -> Result<(), BudgetError> {
        BudgetService::validate_budget(&budget)?;
        let id = budget.id;
        self.store.upsert_budget(budget).await?;
        info!(budget_id = %id, "budget saved");
        Ok(())
    }

    /// Deletes a budget.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NotFound` if no such budget is stored.
    pub async fn delete_budget(&self, id: BudgetId) -> Result<(), BudgetError> {
        self.store.remove_budget(id).await?;
        info!(budget_id = %id, "budget deleted");
        Ok(())
    }
}
