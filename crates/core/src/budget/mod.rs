//! Budget status engine: current-window resolution, status aggregation and
//! the live status stream.

pub mod clock;
pub mod days;
pub mod error;
pub mod period;
pub mod rollover;
pub mod service;
pub mod source;
pub mod stream;
pub mod tracker;
pub mod types;


pub use clock::{Clock, FixedClock, SystemClock};
pub use days::days_remaining;
pub use error::BudgetError;
pub use period::{PeriodResolver, UNBOUNDED_HORIZON_YEARS, anchor_day_in_month, start_of_day};
pub use rollover::{midnight_ticks, until_next_midnight};
pub use service::BudgetService;
pub use source::{BudgetSource, BudgetStore, SpendSource, watch_map, watch_stream};
pub use stream::BudgetStatusStream;
pub use tracker::BudgetTracker;
pub use types::{Budget, BudgetPeriod, BudgetStatus, ResolvedPeriod};
