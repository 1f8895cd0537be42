//! Walletwise budget tracker
//!
//! Seeds an in-memory store with a demo wallet and logs the live budget
//! statuses until interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{Datelike, Days, NaiveDate};
use chrono_tz::Tz;
use futures::StreamExt;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use walletwise_core::budget::{
    Budget, BudgetPeriod, BudgetStatus, BudgetTracker, Clock, SystemClock, start_of_day,
};
use walletwise_shared::AppConfig;
use walletwise_shared::types::{AccountId, CategoryId};
use walletwise_store::{MemoryStore, Transaction};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;

    let json = config.logging.json;
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    let tz = config.tracker.tz()?;
    let clock = Arc::new(SystemClock::new(tz));
    info!(time_zone = %tz, "clock ready");

    let store = Arc::new(MemoryStore::new());
    let tracker = BudgetTracker::new(store.clone(), store.clone(), store.clone(), clock.clone())
        .with_midnight_refresh(config.tracker.midnight_refresh);

    let today = clock.today();
    let demo = seed(&store, &tracker, today, tz).await?;
    info!(budgets = store.budgets().len(), "demo data seeded");

    // A late expense, to show the statuses reacting.
    let late_store = Arc::clone(&store);
    let late_date = clock.now();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        let tx = Transaction::expense(
            demo.wallet,
            demo.groceries,
            Decimal::new(4_150, 2),
            late_date,
        );
        if let Err(e) = late_store.save_transaction(tx) {
            warn!(error = %e, "late expense rejected");
        }
    });

    let mut statuses = tracker.statuses();
    loop {
        tokio::select! {
            next = statuses.next() => match next {
                Some(list) => report(&list)?,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// IDs the late expense needs.
struct Demo {
    wallet: AccountId,
    groceries: CategoryId,
}

async fn seed(
    store: &MemoryStore,
    tracker: &BudgetTracker,
    today: NaiveDate,
    tz: Tz,
) -> anyhow::Result<Demo> {
    let wallet = store.create_account("Wallet", Decimal::new(2_500, 0));
    let groceries = CategoryId::new();
    let transport = CategoryId::new();
    let holiday = CategoryId::new();

    let first_of_month = today.with_day(1).context("first day of month")?;
    let week_ago = today
        .checked_sub_days(Days::new(3))
        .context("weekly anchor out of range")?;
    let trip_start = today
        .checked_sub_days(Days::new(10))
        .context("trip start out of range")?;
    let trip_end = today
        .checked_add_days(Days::new(20))
        .context("trip end out of range")?;

    let budgets = [
        Budget::new(
            groceries,
            Decimal::new(600, 0),
            BudgetPeriod::Monthly,
            start_of_day(first_of_month, tz),
        ),
        Budget::new(
            transport,
            Decimal::new(75, 0),
            BudgetPeriod::Weekly,
            start_of_day(week_ago, tz),
        ),
        Budget::new(
            holiday,
            Decimal::new(1_200, 0),
            BudgetPeriod::Custom,
            start_of_day(trip_start, tz),
        )
        .with_end_date(start_of_day(trip_end, tz)),
    ];
    for budget in budgets {
        tracker.save_budget(budget).await?;
    }

    let now = start_of_day(today, tz);
    for (category, amount) in [
        (groceries, Decimal::new(8_420, 2)),
        (groceries, Decimal::new(13_275, 2)),
        (transport, Decimal::new(1_840, 2)),
        (holiday, Decimal::new(35_000, 2)),
    ] {
        store.save_transaction(Transaction::expense(wallet.id, category, amount, now))?;
    }
    store.save_transaction(Transaction::income(
        wallet.id,
        CategoryId::new(),
        Decimal::new(1_000, 0),
        now,
    ))?;

    Ok(Demo {
        wallet: wallet.id,
        groceries,
    })
}

fn report(statuses: &[BudgetStatus]) -> anyhow::Result<()> {
    info!(count = statuses.len(), "budget statuses");
    for status in statuses {
        info!(
            budget_id = %status.budget.id,
            period = ?status.budget.period,
            spent = %status.spent_amount,
            remaining = %status.remaining_amount,
            percentage = %status.percentage_used,
            over_budget = status.is_over_budget,
            days_remaining = status.days_remaining,
            "budget status"
        );
    }
    debug!(statuses = %serde_json::to_string(statuses)?, "status snapshot");
    Ok(())
}
