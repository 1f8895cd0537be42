//! Current-window resolution for recurring and custom budgets.
//!
//! All boundaries are computed on local calendar dates in an explicitly
//! supplied time zone and converted back to UTC instants at start-of-day.

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::types::{Budget, BudgetPeriod, ResolvedPeriod};

/// How far ahead an open-ended custom budget reaches.
pub const UNBOUNDED_HORIZON_YEARS: u32 = 10;

/// Resolves the window a budget is tracking on a given day.
pub struct PeriodResolver;

impl PeriodResolver {
    /// Computes the window that contains `today` (or, for custom budgets, the
    /// fixed window of the budget).
    ///
    /// Never fails: a custom window whose end precedes its start falls back to
    /// the open-ended horizon.
    #[must_use]
    pub fn resolve_current_period(budget: &Budget, today: NaiveDate, tz: Tz) -> ResolvedPeriod {
        match budget.period {
            BudgetPeriod::Custom => Self::custom_window(budget, today, tz),
            BudgetPeriod::Monthly => {
                let anchor = budget.start_date.with_timezone(&tz).day();
                let (start, next_start) = Self::monthly_bounds(anchor, today);
                Self::from_local_dates(start, next_start, tz)
            }
            BudgetPeriod::Weekly => {
                let anchor = budget.start_date.with_timezone(&tz).weekday();
                let back = (7 + today.weekday().num_days_from_monday()
                    - anchor.num_days_from_monday())
                    % 7;
                let start = today
                    .checked_sub_days(Days::new(u64::from(back)))
                    .unwrap_or(today);
                let next_start = start.checked_add_days(Days::new(7)).unwrap_or(start);
                Self::from_local_dates(start, next_start, tz)
            }
        }
    }

    fn custom_window(budget: &Budget, today: NaiveDate, tz: Tz) -> ResolvedPeriod {
        let period_start = budget.start_date;
        let period_from = start_of_day(period_start.with_timezone(&tz).date_naive(), tz);
        match budget.end_date {
            Some(end) if end >= period_start => {
                let last_day = end.with_timezone(&tz).date_naive();
                ResolvedPeriod {
                    period_start,
                    period_end: end,
                    period_from,
                    period_until: start_of_day(last_day.succ_opt().unwrap_or(last_day), tz),
                }
            }
            _ => {
                let horizon = today
                    .checked_add_months(Months::new(12 * UNBOUNDED_HORIZON_YEARS))
                    .unwrap_or(NaiveDate::MAX);
                ResolvedPeriod {
                    period_start,
                    period_end: start_of_day(horizon, tz),
                    period_from,
                    period_until: start_of_day(horizon.succ_opt().unwrap_or(horizon), tz),
                }
            }
        }
    }

    /// Returns the first day of the monthly window containing `today` and the
    /// first day of the window after it.
    fn monthly_bounds(anchor_day: u32, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let this_month = today.with_day(1).unwrap_or(today);
        let start_month = if today.day() >= anchor_day_in_month(anchor_day, this_month) {
            this_month
        } else {
            this_month
                .checked_sub_months(Months::new(1))
                .unwrap_or(this_month)
        };
        let next_month = start_month
            .checked_add_months(Months::new(1))
            .unwrap_or(start_month);

        (
            place_anchor(anchor_day, start_month),
            place_anchor(anchor_day, next_month),
        )
    }

    fn from_local_dates(first: NaiveDate, next_first: NaiveDate, tz: Tz) -> ResolvedPeriod {
        let last = next_first.pred_opt().unwrap_or(first).max(first);
        let period_start = start_of_day(first, tz);
        ResolvedPeriod {
            period_start,
            period_end: start_of_day(last, tz),
            period_from: period_start,
            period_until: start_of_day(next_first.max(first), tz),
        }
    }
}

/// Day a monthly anchor lands on in the month of `first_of_month`.
///
/// Anchors past the end of a short month land on its last day, so an anchor
/// of 31 gives Feb 28 (or 29) and Apr 30. Anchors below 1 land on day 1.
#[must_use]
pub fn anchor_day_in_month(anchor_day: u32, first_of_month: NaiveDate) -> u32 {
    anchor_day.clamp(1, days_in_month(first_of_month))
}

fn place_anchor(anchor_day: u32, first_of_month: NaiveDate) -> NaiveDate {
    first_of_month
        .with_day(anchor_day_in_month(anchor_day, first_of_month))
        .unwrap_or(first_of_month)
}

fn days_in_month(first_of_month: NaiveDate) -> u32 {
    first_of_month
        .checked_add_months(Months::new(1))
        .and_then(|next| next.with_day(1))
        .and_then(|next| next.pred_opt())
        .map_or(28, |last| last.day())
}

/// First instant of `date` in `tz`, as UTC.
///
/// When a DST jump skips local midnight, the first existing minute of the day
/// is used instead.
#[must_use]
pub fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=180)
        .find_map(|minute| {
            tz.from_local_datetime(&(midnight + Duration::minutes(minute)))
                .earliest()
        })
        .map_or_else(
            || Utc.from_utc_datetime(&midnight),
            |local| local.with_timezone(&Utc),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use walletwise_shared::types::CategoryId;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn budget(period: BudgetPeriod, start: DateTime<Utc>) -> Budget {
        Budget::new(CategoryId::new(), dec!(100), period, start)
    }

    #[rstest]
    #[case(31, ymd(2025, 2, 1), 28)]
    #[case(31, ymd(2024, 2, 1), 29)]
    #[case(31, ymd(2025, 4, 1), 30)]
    #[case(30, ymd(2025, 4, 1), 30)]
    #[case(29, ymd(2025, 2, 1), 28)]
    #[case(15, ymd(2025, 2, 1), 15)]
    #[case(0, ymd(2025, 6, 1), 1)]
    fn test_anchor_day_in_month(#[case] anchor: u32, #[case] month: NaiveDate, #[case] day: u32) {
        assert_eq!(anchor_day_in_month(anchor, month), day);
    }

    #[rstest]
    // anchor later in the month than today: window began last month
    #[case(ymd(2025, 1, 15), ymd(2025, 3, 10), ymd(2025, 2, 15), ymd(2025, 3, 14))]
    // on or after the anchor: window began this month
    #[case(ymd(2025, 1, 15), ymd(2025, 3, 15), ymd(2025, 3, 15), ymd(2025, 4, 14))]
    #[case(ymd(2025, 1, 15), ymd(2025, 3, 20), ymd(2025, 3, 15), ymd(2025, 4, 14))]
    // anchor on the 1st covers the calendar month
    #[case(ymd(2024, 6, 1), ymd(2025, 1, 1), ymd(2025, 1, 1), ymd(2025, 1, 31))]
    // crossing the year boundary
    #[case(ymd(2024, 5, 20), ymd(2025, 1, 5), ymd(2024, 12, 20), ymd(2025, 1, 19))]
    // anchor 31 in February: previous window ends the day before Feb 28
    #[case(ymd(2025, 1, 31), ymd(2025, 2, 15), ymd(2025, 1, 31), ymd(2025, 2, 27))]
    #[case(ymd(2025, 1, 31), ymd(2025, 2, 28), ymd(2025, 2, 28), ymd(2025, 3, 30))]
    #[case(ymd(2025, 1, 31), ymd(2025, 3, 31), ymd(2025, 3, 31), ymd(2025, 4, 29))]
    fn test_monthly_window(
        #[case] anchor: NaiveDate,
        #[case] today: NaiveDate,
        #[case] start: NaiveDate,
        #[case] end: NaiveDate,
    ) {
        let b = budget(BudgetPeriod::Monthly, start_of_day(anchor, Tz::UTC));
        let period = PeriodResolver::resolve_current_period(&b, today, Tz::UTC);

        assert_eq!(period.period_start, start_of_day(start, Tz::UTC));
        assert_eq!(period.period_end, start_of_day(end, Tz::UTC));
        assert_eq!(period.period_until, start_of_day(end + Days::new(1), Tz::UTC));
    }

    #[test]
    fn test_monthly_anchor_31_stays_closed_and_contains_today() {
        let b = budget(BudgetPeriod::Monthly, utc(2025, 1, 31));
        let today = ymd(2025, 2, 15);
        let period = PeriodResolver::resolve_current_period(&b, today, Tz::UTC);

        assert!(period.period_start <= period.period_end);
        assert!(period.contains(start_of_day(today, Tz::UTC)));
    }

    #[rstest]
    #[case(ymd(2025, 1, 6), ymd(2025, 1, 1))] // Monday after
    #[case(ymd(2025, 1, 7), ymd(2025, 1, 1))] // Tuesday, last day
    #[case(ymd(2025, 1, 8), ymd(2025, 1, 8))] // next Wednesday starts a new week
    #[case(ymd(2025, 1, 1), ymd(2025, 1, 1))] // the anchor day itself
    fn test_weekly_window(#[case] today: NaiveDate, #[case] start: NaiveDate) {
        // 2025-01-01 is a Wednesday
        let b = budget(BudgetPeriod::Weekly, utc(2025, 1, 1));
        let period = PeriodResolver::resolve_current_period(&b, today, Tz::UTC);

        assert_eq!(period.period_start, start_of_day(start, Tz::UTC));
        assert_eq!(
            period.period_end,
            start_of_day(start + Days::new(6), Tz::UTC)
        );
        assert!(period.contains(start_of_day(today, Tz::UTC)));
    }

    #[test]
    fn test_custom_bounded_ignores_today() {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 3, 10, 30, 0).unwrap();
        let end = t0 + Duration::days(30);
        let b = budget(BudgetPeriod::Custom, t0).with_end_date(end);

        for today in [ymd(2020, 1, 1), ymd(2025, 3, 10), ymd(2030, 12, 31)] {
            let period = PeriodResolver::resolve_current_period(&b, today, Tz::UTC);
            assert_eq!(period.period_start, t0);
            assert_eq!(period.period_end, end);
        }
    }

    #[test]
    fn test_custom_bounded_until_covers_whole_last_day() {
        let t0 = utc(2025, 3, 1);
        let b = budget(BudgetPeriod::Custom, t0).with_end_date(utc(2025, 3, 31));
        let period = PeriodResolver::resolve_current_period(&b, ymd(2025, 3, 5), Tz::UTC);

        assert!(period.contains(Utc.with_ymd_and_hms(2025, 3, 31, 18, 0, 0).unwrap()));
        assert!(!period.contains(utc(2025, 4, 1)));
    }

    #[test]
    fn test_custom_window_covers_whole_first_day() {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 3, 10, 30, 0).unwrap();
        let b = budget(BudgetPeriod::Custom, t0).with_end_date(t0 + Duration::days(30));
        let period = PeriodResolver::resolve_current_period(&b, ymd(2025, 3, 10), Tz::UTC);

        assert_eq!(period.period_start, t0);
        assert_eq!(period.period_from, utc(2025, 3, 3));
        assert!(period.contains(Utc.with_ymd_and_hms(2025, 3, 3, 8, 0, 0).unwrap()));
        assert!(period.contains(Utc.with_ymd_and_hms(2025, 4, 2, 23, 0, 0).unwrap()));
        assert!(!period.contains(Utc.with_ymd_and_hms(2025, 3, 2, 23, 59, 0).unwrap()));
    }

    #[test]
    fn test_custom_first_day_is_read_in_local_zone() {
        // 22:00 UTC on Mar 2 is already Mar 3 in Jakarta (UTC+7)
        let t0 = Utc.with_ymd_and_hms(2025, 3, 2, 22, 0, 0).unwrap();
        let tz = chrono_tz::Asia::Jakarta;
        let b = budget(BudgetPeriod::Custom, t0);
        let period = PeriodResolver::resolve_current_period(&b, ymd(2025, 3, 10), tz);

        assert_eq!(period.period_from, Utc.with_ymd_and_hms(2025, 3, 2, 17, 0, 0).unwrap());
        assert!(period.contains(Utc.with_ymd_and_hms(2025, 3, 2, 18, 0, 0).unwrap()));
    }

    #[test]
    fn test_recurring_window_starts_at_its_first_instant() {
        let b = budget(BudgetPeriod::Weekly, utc(2025, 1, 1));
        let period = PeriodResolver::resolve_current_period(&b, ymd(2025, 1, 3), Tz::UTC);

        assert_eq!(period.period_from, period.period_start);
    }

    #[test]
    fn test_custom_unbounded_reaches_ten_years() {
        let b = budget(BudgetPeriod::Custom, utc(2025, 1, 1));
        let today = ymd(2025, 3, 10);
        let period = PeriodResolver::resolve_current_period(&b, today, Tz::UTC);

        assert_eq!(period.period_start, utc(2025, 1, 1));
        assert_eq!(period.period_end, utc(2035, 3, 10));
    }

    #[test]
    fn test_custom_end_before_start_degrades_to_unbounded() {
        let b = budget(BudgetPeriod::Custom, utc(2025, 6, 1)).with_end_date(utc(2025, 5, 1));
        let period = PeriodResolver::resolve_current_period(&b, ymd(2025, 6, 2), Tz::UTC);

        assert_eq!(period.period_start, utc(2025, 6, 1));
        assert_eq!(period.period_end, utc(2035, 6, 2));
    }

    #[test]
    fn test_anchor_is_read_in_local_zone() {
        // 23:30 UTC on Jan 31 is already Feb 1 in Tokyo
        let start = Utc.with_ymd_and_hms(2025, 1, 31, 23, 30, 0).unwrap();
        let b = budget(BudgetPeriod::Monthly, start);
        let tz = chrono_tz::Asia::Tokyo;
        let period = PeriodResolver::resolve_current_period(&b, ymd(2025, 2, 10), tz);

        assert_eq!(
            period.period_start,
            Utc.with_ymd_and_hms(2025, 1, 31, 15, 0, 0).unwrap()
        );
        assert_eq!(period.period_end, start_of_day(ymd(2025, 2, 28), tz));
    }

    #[test]
    fn test_start_of_day_skips_dst_gap_at_midnight() {
        // Brazil moved clocks from 00:00 to 01:00 on 2018-11-04
        let tz = chrono_tz::America::Sao_Paulo;
        let start = start_of_day(ymd(2018, 11, 4), tz);

        assert_eq!(start, Utc.with_ymd_and_hms(2018, 11, 4, 3, 0, 0).unwrap());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let b = budget(BudgetPeriod::Monthly, utc(2024, 8, 17));
        let today = ymd(2025, 7, 2);
        let tz = chrono_tz::Europe::Berlin;

        assert_eq!(
            PeriodResolver::resolve_current_period(&b, today, tz),
            PeriodResolver::resolve_current_period(&b, today, tz)
        );
    }
}
