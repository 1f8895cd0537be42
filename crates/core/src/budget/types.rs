//! Budget data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use walletwise_shared::types::{BudgetId, CategoryId};

/// Recurrence rule of a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    /// Rolling month anchored on the day-of-month of the start date.
    Monthly,
    /// Rolling week anchored on the weekday of the start date.
    Weekly,
    /// Fixed window from the start date to the optional end date.
    Custom,
}

/// A spending cap for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Budget ID.
    pub id: BudgetId,
    /// Category the cap applies to.
    pub category_id: CategoryId,
    /// Cap for one period.
    pub max_amount: Decimal,
    /// Recurrence rule.
    pub period: BudgetPeriod,
    /// Anchor of the recurrence, or the literal window start for custom budgets.
    pub start_date: DateTime<Utc>,
    /// Literal window end, only meaningful for custom budgets.
    pub end_date: Option<DateTime<Utc>>,
    /// Whether the budget is tracked.
    pub is_active: bool,
}

impl Budget {
    /// Creates an active budget with a fresh ID and no end date.
    #[must_use]
    pub fn new(
        category_id: CategoryId,
        max_amount: Decimal,
        period: BudgetPeriod,
        start_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BudgetId::new(),
            category_id,
            max_amount,
            period,
            start_date,
            end_date: None,
            is_active: true,
        }
    }

    /// Sets the literal window end.
    #[must_use]
    pub fn with_end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Sets the active flag.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

/// The concrete window a budget is currently tracking.
///
/// `period_start` and `period_end` are inclusive at day granularity.
/// Spend is matched on whole days: from `period_from` (start of the first
/// day) up to `period_until` (first instant after the last day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedPeriod {
    /// Start of the window. For custom budgets this is the budget's own
    /// start instant.
    pub period_start: DateTime<Utc>,
    /// Start of the last day of the window (custom budgets: the end instant).
    pub period_end: DateTime<Utc>,
    /// Start of the day `period_start` falls on.
    pub period_from: DateTime<Utc>,
    /// Start of the day after `period_end`.
    pub period_until: DateTime<Utc>,
}

impl ResolvedPeriod {
    /// Returns true if `at` falls on any day of the window.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.period_from && at < self.period_until
    }
}

/// Point-in-time consumption of a budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetStatus {
    /// The budget this status describes.
    pub budget: Budget,
    /// Window the figures were computed for. `None` for inactive budgets.
    pub period: Option<ResolvedPeriod>,
    /// Spend inside the window.
    pub spent_amount: Decimal,
    /// `max_amount - spent_amount`, negative when over budget.
    pub remaining_amount: Decimal,
    /// Percentage used, clamped to `[0, 100]`.
    pub percentage_used: Decimal,
    /// Percentage used without clamping (may exceed 100 or be negative).
    pub raw_percentage: Decimal,
    /// True iff `remaining_amount < 0`.
    pub is_over_budget: bool,
    /// Whole days until the window ends, never negative.
    pub days_remaining: u32,
}
