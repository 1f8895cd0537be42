//! Local-midnight ticks that let status streams pick up period rollover.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, Utc};
use chrono_tz::Tz;
use futures::StreamExt;
use futures::stream::{self, BoxStream};

use super::clock::Clock;
use super::period::start_of_day;

/// Lower bound on a wait, so a clock sitting exactly on midnight cannot spin.
const MIN_WAIT: Duration = Duration::from_secs(1);

/// Time from `now` until the next local midnight in `tz`.
#[must_use]
pub fn until_next_midnight(now: DateTime<Utc>, tz: Tz) -> Duration {
    let today = now.with_timezone(&tz).date_naive();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    (start_of_day(tomorrow, tz) - now)
        .to_std()
        .unwrap_or(MIN_WAIT)
        .max(MIN_WAIT)
}

/// Endless stream yielding once at every local midnight of `clock`.
pub fn midnight_ticks(clock: Arc<dyn Clock>) -> BoxStream<'static, ()> {
    stream::unfold(clock, |clock| async move {
        tokio::time::sleep(until_next_midnight(clock.now(), clock.time_zone())).await;
        Some(((), clock))
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wait_until_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 23, 0, 0).unwrap();
        assert_eq!(until_next_midnight(now, Tz::UTC), Duration::from_secs(3600));
    }

    #[test]
    fn test_wait_respects_zone() {
        // 12:00 UTC is 21:00 in Tokyo
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            until_next_midnight(now, chrono_tz::Asia::Tokyo),
            Duration::from_secs(3 * 3600)
        );
    }

    #[test]
    fn test_wait_at_midnight_is_a_full_day() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(until_next_midnight(now, Tz::UTC), Duration::from_secs(86_400));
    }

    #[test]
    fn test_wait_across_dst_change() {
        // Europe/Berlin springs forward on 2025-03-30, a 23 hour day
        let tz = chrono_tz::Europe::Berlin;
        let now = start_of_day(chrono::NaiveDate::from_ymd_opt(2025, 3, 30).unwrap(), tz);
        assert_eq!(until_next_midnight(now, tz), Duration::from_secs(23 * 3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_fire_at_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 23, 59, 0).unwrap();
        let clock = Arc::new(crate::budget::clock::FixedClock::new(now, Tz::UTC));
        let mut ticks = midnight_ticks(clock);

        let started = tokio::time::Instant::now();
        assert_eq!(ticks.next().await, Some(()));
        assert_eq!(started.elapsed(), Duration::from_secs(60));
    }
}
