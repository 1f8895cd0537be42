//! Live list of budget statuses over a changing set of budgets.
//!
//! A single driver task owns all per-budget state. Each active budget gets one
//! spend subscription, spawned into a `JoinSet` and tagged with an epoch so that
//! figures from a cancelled subscription are ignored. When the budget set
//! changes, subscriptions are reconciled by budget identity instead of being
//! rebuilt.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::NaiveDate;
use chrono_tz::Tz;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle, JoinSet};
use tracing::{debug, warn};
use walletwise_shared::types::BudgetId;

use super::clock::Clock;
use super::period::PeriodResolver;
use super::service::BudgetService;
use super::source::SpendSource;
use super::types::{Budget, BudgetStatus, ResolvedPeriod};

/// Stream of status lists, one entry per budget in source order.
///
/// The first list is emitted as soon as every budget has a spend figure (or
/// immediately for an empty set). After that, every spend change, budget set
/// change or refresh tick produces a fresh list. A consumer that falls behind
/// skips straight to the newest list.
///
/// Dropping the stream stops the driver and all of its spend subscriptions.
pub struct BudgetStatusStream {
    statuses: BoxStream<'static, Vec<BudgetStatus>>,
    driver: JoinHandle<()>,
}

impl BudgetStatusStream {
    /// Starts the driver task. Must be called from within a tokio runtime.
    pub fn spawn(
        budgets: BoxStream<'static, Vec<Budget>>,
        spend: Arc<dyn SpendSource>,
        clock: Arc<dyn Clock>,
        refresh: Option<BoxStream<'static, ()>>,
    ) -> Self {
        let (out, latest) = watch::channel(None);
        let driver = StatusDriver::new(spend, clock, out);
        let driver = tokio::spawn(driver.run(budgets, refresh));
        Self {
            statuses: latest_statuses(latest),
            driver,
        }
    }
}

/// Yields the newest published list each time the driver publishes.
fn latest_statuses(
    latest: watch::Receiver<Option<Vec<BudgetStatus>>>,
) -> BoxStream<'static, Vec<BudgetStatus>> {
    stream::unfold(latest, |mut latest| async move {
        loop {
            latest.changed().await.ok()?;
            let published = latest.borrow_and_update().clone();
            if let Some(statuses) = published {
                return Some((statuses, latest));
            }
        }
    })
    .boxed()
}

impl Stream for BudgetStatusStream {
    type Item = Vec<BudgetStatus>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.statuses.poll_next_unpin(cx)
    }
}

impl Drop for BudgetStatusStream {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

#[derive(Debug)]
struct SpendUpdate {
    budget_id: BudgetId,
    epoch: u64,
    amount: Decimal,
}

struct Tracked {
    budget: Budget,
    period: Option<ResolvedPeriod>,
    epoch: u64,
    subscription: Option<AbortHandle>,
    spent: Option<Decimal>,
}

impl Tracked {
    fn is_ready(&self) -> bool {
        !self.budget.is_active || self.spent.is_some()
    }

    fn cancel(&self) {
        if let Some(handle) = &self.subscription {
            handle.abort();
        }
    }

    fn status(&self, today: NaiveDate, tz: Tz) -> BudgetStatus {
        match (self.period, self.spent) {
            (Some(period), Some(spent)) => {
                BudgetService::aggregate(&self.budget, &period, spent, today, tz)
            }
            _ => BudgetService::inactive_status(&self.budget),
        }
    }
}

struct StatusDriver {
    spend: Arc<dyn SpendSource>,
    clock: Arc<dyn Clock>,
    out: watch::Sender<Option<Vec<BudgetStatus>>>,
    updates_tx: mpsc::UnboundedSender<SpendUpdate>,
    updates: mpsc::UnboundedReceiver<SpendUpdate>,
    order: Vec<BudgetId>,
    tracked: HashMap<BudgetId, Tracked>,
    subscriptions: JoinSet<()>,
    next_epoch: u64,
}

impl StatusDriver {
    fn new(
        spend: Arc<dyn SpendSource>,
        clock: Arc<dyn Clock>,
        out: watch::Sender<Option<Vec<BudgetStatus>>>,
    ) -> Self {
        let (updates_tx, updates) = mpsc::unbounded_channel();
        Self {
            spend,
            clock,
            out,
            updates_tx,
            updates,
            order: Vec::new(),
            tracked: HashMap::new(),
            subscriptions: JoinSet::new(),
            next_epoch: 0,
        }
    }

    async fn run(
        mut self,
        mut budgets: BoxStream<'static, Vec<Budget>>,
        mut refresh: Option<BoxStream<'static, ()>>,
    ) {
        let mut budgets_open = true;

        loop {
            tokio::select! {
                () = self.out.closed() => {
                    debug!("status consumer dropped");
                    break;
                }
                set = budgets.next(), if budgets_open => match set {
                    Some(set) => {
                        self.reconcile(set);
                        self.publish();
                    }
                    None => {
                        warn!("budget source ended, keeping last known budget set");
                        budgets_open = false;
                    }
                },
                Some(update) = self.updates.recv() => {
                    if self.apply(&update) {
                        self.roll_over();
                        self.publish();
                    }
                }
                tick = next_tick(refresh.as_mut()) => match tick {
                    Some(()) => {
                        debug!("refresh tick");
                        self.roll_over();
                        self.publish();
                    }
                    None => refresh = None,
                },
                Some(joined) = self.subscriptions.join_next(), if !self.subscriptions.is_empty() => {
                    if let Err(err) = joined {
                        if err.is_panic() {
                            warn!(error = %err, "spend subscription panicked");
                        }
                    }
                }
            }
        }
    }

    /// Brings subscriptions in line with a new budget set. Budgets that are
    /// unchanged and still resolve to the same window keep their subscription.
    fn reconcile(&mut self, set: Vec<Budget>) {
        let today = self.clock.today();
        let tz = self.clock.time_zone();
        let mut previous = std::mem::take(&mut self.tracked);
        let mut order = Vec::with_capacity(set.len());
        let (mut kept, mut started) = (0usize, 0usize);

        for budget in set {
            let id = budget.id;
            if self.tracked.contains_key(&id) {
                warn!(budget_id = %id, "duplicate budget in set, ignoring");
                continue;
            }
            let period = budget
                .is_active
                .then(|| PeriodResolver::resolve_current_period(&budget, today, tz));

            let entry = match previous.remove(&id) {
                Some(existing) if existing.budget == budget && existing.period == period => {
                    kept += 1;
                    existing
                }
                Some(stale) => {
                    stale.cancel();
                    started += 1;
                    self.track(budget, period)
                }
                None => {
                    started += 1;
                    self.track(budget, period)
                }
            };
            order.push(id);
            self.tracked.insert(id, entry);
        }

        let dropped = previous.len();
        for stale in previous.into_values() {
            stale.cancel();
        }
        self.order = order;

        debug!(
            budgets = self.order.len(),
            kept, started, dropped, "reconciled budget set"
        );
    }

    fn track(&mut self, budget: Budget, period: Option<ResolvedPeriod>) -> Tracked {
        let Some(window) = period else {
            return Tracked {
                budget,
                period: None,
                epoch: 0,
                subscription: None,
                spent: None,
            };
        };

        self.next_epoch += 1;
        let epoch = self.next_epoch;
        let budget_id = budget.id;
        let mut amounts = self.spend.spent_amount(budget.category_id, &window);
        let updates = self.updates_tx.clone();

        let subscription = self.subscriptions.spawn(async move {
            while let Some(amount) = amounts.next().await {
                let update = SpendUpdate {
                    budget_id,
                    epoch,
                    amount,
                };
                if updates.send(update).is_err() {
                    return;
                }
            }
            debug!(%budget_id, "spend source ended");
        });

        Tracked {
            budget,
            period: Some(window),
            epoch,
            subscription: Some(subscription),
            spent: None,
        }
    }

    fn apply(&mut self, update: &SpendUpdate) -> bool {
        match self.tracked.get_mut(&update.budget_id) {
            Some(tracked) if tracked.epoch == update.epoch => {
                tracked.spent = Some(update.amount);
                true
            }
            _ => {
                debug!(budget_id = %update.budget_id, epoch = update.epoch, "discarding stale spend figure");
                false
            }
        }
    }

    /// Resubscribes every active budget whose current window moved since it
    /// was subscribed.
    fn roll_over(&mut self) {
        let today = self.clock.today();
        let tz = self.clock.time_zone();

        let moved: Vec<(BudgetId, ResolvedPeriod)> = self
            .tracked
            .values()
            .filter(|t| t.budget.is_active)
            .filter_map(|t| {
                let current = PeriodResolver::resolve_current_period(&t.budget, today, tz);
                (t.period != Some(current)).then_some((t.budget.id, current))
            })
            .collect();

        for (id, period) in moved {
            if let Some(old) = self.tracked.remove(&id) {
                debug!(budget_id = %id, start = %period.period_start, "period rolled over");
                old.cancel();
                let fresh = self.track(old.budget, Some(period));
                self.tracked.insert(id, fresh);
            }
        }
    }

    fn publish(&self) {
        let ready = self
            .order
            .iter()
            .all(|id| self.tracked.get(id).is_some_and(Tracked::is_ready));
        if !ready {
            return;
        }

        let today = self.clock.today();
        let tz = self.clock.time_zone();
        let statuses: Vec<BudgetStatus> = self
            .order
            .iter()
            .filter_map(|id| self.tracked.get(id))
            .map(|t| t.status(today, tz))
            .collect();

        debug!(count = statuses.len(), "publishing budget statuses");
        self.out.send_replace(Some(statuses));
    }
}

async fn next_tick(refresh: Option<&mut BoxStream<'static, ()>>) -> Option<()> {
    match refresh {
        Some(ticks) => ticks.next().await,
        None => std::future::pending().await,
    }
}
