//! Budget service for status calculation and validation.

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::Decimal;

use super::days::days_remaining;
use super::error::BudgetError;
use super::types::{Budget, BudgetPeriod, BudgetStatus, ResolvedPeriod};

/// Budget service for business logic.
pub struct BudgetService;

impl BudgetService {
    /// Combine a budget, its current window and the spend inside it.
    ///
    /// remaining = max - spent, over budget iff remaining < 0.
    /// percentage = spent / max * 100, clamped to [0, 100]; the unclamped figure
    /// is kept in `raw_percentage`. A cap of zero or less yields 0%.
    ///
    /// Inactive budgets are not tracked and get [`Self::inactive_status`].
    #[must_use]
    pub fn aggregate(
        budget: &Budget,
        period: &ResolvedPeriod,
        spent: Decimal,
        today: NaiveDate,
        tz: Tz,
    ) -> BudgetStatus {
        if !budget.is_active {
            return Self::inactive_status(budget);
        }

        // Overflow saturates in the direction of the spend.
        let remaining = budget.max_amount.checked_sub(spent).unwrap_or(
            if spent.is_sign_negative() { Decimal::MAX } else { Decimal::MIN },
        );

        let raw_percentage = if budget.max_amount > Decimal::ZERO {
            spent
                .checked_div(budget.max_amount)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .map_or(
                    if spent.is_sign_negative() { Decimal::MIN } else { Decimal::MAX },
                    |pct| pct.round_dp(2),
                )
        } else {
            Decimal::ZERO
        };

        BudgetStatus {
            budget: budget.clone(),
            period: Some(*period),
            spent_amount: spent,
            remaining_amount: remaining,
            percentage_used: raw_percentage.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED),
            raw_percentage,
            is_over_budget: remaining < Decimal::ZERO,
            days_remaining: days_remaining(period.period_end, today, tz),
        }
    }

    /// Degenerate status of an untracked budget: nothing spent, full cap left.
    #[must_use]
    pub fn inactive_status(budget: &Budget) -> BudgetStatus {
        BudgetStatus {
            budget: budget.clone(),
            period: None,
            spent_amount: Decimal::ZERO,
            remaining_amount: budget.max_amount,
            percentage_used: Decimal::ZERO,
            raw_percentage: Decimal::ZERO,
            is_over_budget: false,
            days_remaining: 0,
        }
    }

    /// Validate a budget before it is saved.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NonPositiveAmount` if the cap is zero or negative.
    /// Returns `BudgetError::EndDateNotAllowed` if a recurring budget has an end date.
    /// Returns `BudgetError::EndBeforeStart` if a custom window ends before it starts.
    pub fn validate_budget(budget: &Budget) -> Result<(), BudgetError> {
        if budget.max_amount <= Decimal::ZERO {
            return Err(BudgetError::NonPositiveAmount);
        }

        match (budget.period, budget.end_date) {
            (BudgetPeriod::Monthly | BudgetPeriod::Weekly, Some(_)) => {
                Err(BudgetError::EndDateNotAllowed)
            }
            (BudgetPeriod::Custom, Some(end)) if end < budget.start_date => {
                Err(BudgetError::EndBeforeStart)
            }
            _ => Ok(()),
        }
    }
}
