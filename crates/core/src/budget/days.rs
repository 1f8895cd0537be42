//! Days left in a budget window.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Whole days from `today` to the local date of `period_end`.
///
/// A window ending today has 0 days left, one ending tomorrow has 1. A window
/// that already ended also reports 0.
#[must_use]
pub fn days_remaining(period_end: DateTime<Utc>, today: NaiveDate, tz: Tz) -> u32 {
    let end = period_end.with_timezone(&tz).date_naive();
    if end < today {
        return 0;
    }
    u32::try_from((end - today).num_days()).unwrap_or(u32::MAX)
}
