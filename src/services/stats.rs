// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in statistics: total count, this-month count and streak.
//!
//! All three numbers are computed from the raw record timestamps on every
//! request. The computation is a pure function of the timestamps and the
//! current time in the caller's chosen time zone.

use crate::models::CheckinStats;
use crate::time_utils::{day_bounds_ms, month_bounds_ms};
use chrono::{DateTime, Days, Local, TimeZone, Utc};

/// Maximum number of days walked back when computing a streak.
///
/// A user with a longer unbroken run reports this value.
pub const MAX_STREAK_DAYS: u32 = 365;

/// Check-in timestamps sorted ascending, for range lookups.
#[derive(Debug, Clone, Default)]
pub struct CheckinTimeline {
    sorted: Vec<i64>,
}

impl CheckinTimeline {
    pub fn new(mut timestamps: Vec<i64>) -> Self {
        timestamps.sort_unstable();
        Self { sorted: timestamps }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Number of timestamps in `[start, end)`.
    pub fn count_in(&self, start: i64, end: i64) -> usize {
        if end <= start {
            return 0;
        }
        let lo = self.sorted.partition_point(|&t| t < start);
        let hi = self.sorted.partition_point(|&t| t < end);
        hi - lo
    }

    /// Whether any timestamp falls in `[start, end]`.
    pub fn any_within(&self, start: i64, end_inclusive: i64) -> bool {
        let lo = self.sorted.partition_point(|&t| t < start);
        self.sorted
            .get(lo)
            .is_some_and(|&t| t <= end_inclusive)
    }

    /// Consecutive days with at least one check-in, ending today.
    ///
    /// Today is day zero: no check-in today means a streak of zero, even if
    /// yesterday had one.
    pub fn continuous_days<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> u32 {
        if self.is_empty() {
            return 0;
        }

        let tz = now.timezone();
        let today = now.date_naive();
        let mut streak = 0;

        for offset in 0..MAX_STREAK_DAYS {
            let Some(day) = today.checked_sub_days(Days::new(offset.into())) else {
                break;
            };
            let Some((start, end)) = day_bounds_ms(&tz, day) else {
                break;
            };
            if !self.any_within(start, end) {
                break;
            }
            streak += 1;
        }

        streak
    }

    /// Check-ins in the calendar month containing `now`.
    pub fn this_month<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> u64 {
        month_bounds_ms(now)
            .map(|(start, end)| self.count_in(start, end) as u64)
            .unwrap_or(0)
    }
}

/// Compute the full statistics for one user's check-in timestamps.
pub fn compute_stats<Tz: TimeZone>(timestamps: Vec<i64>, now: &DateTime<Tz>) -> CheckinStats {
    let timeline = CheckinTimeline::new(timestamps);
    CheckinStats {
        total_count: timeline.len() as u64,
        continuous_days: timeline.continuous_days(now),
        this_month: timeline.this_month(now),
    }
}

/// Millisecond bounds `[start, end]` of the local day containing `now`.
pub fn today_bounds_ms<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<(i64, i64)> {
    day_bounds_ms(&now.timezone(), now.date_naive())
}

/// [`compute_stats`] at the current instant, in `zone` or server local time.
pub fn stats_now(timestamps: Vec<i64>, zone: Option<chrono_tz::Tz>) -> CheckinStats {
    match zone {
        Some(tz) => compute_stats(timestamps, &Utc::now().with_timezone(&tz)),
        None => compute_stats(timestamps, &Local::now()),
    }
}

/// [`today_bounds_ms`] at the current instant, in `zone` or server local time.
pub fn today_bounds_now(zone: Option<chrono_tz::Tz>) -> Option<(i64, i64)> {
    match zone {
        Some(tz) => today_bounds_ms(&Utc::now().with_timezone(&tz)),
        None => today_bounds_ms(&Local::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};
    use chrono_tz::America::New_York;
    use chrono_tz::Asia::Shanghai;

    fn at<Tz: TimeZone>(tz: &Tz, y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Tz> {
        tz.with_ymd_and_hms(y, m, d, h, mi, s).unwrap()
    }

    fn ms<Tz: TimeZone>(tz: &Tz, y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> i64 {
        at(tz, y, m, d, h, mi, s).timestamp_millis()
    }

    #[test]
    fn test_no_records() {
        let now = at(&Shanghai, 2024, 5, 20, 9, 0, 0);
        let stats = compute_stats(vec![], &now);
        assert_eq!(stats, CheckinStats::default());
    }

    #[test]
    fn test_streak_three_days() {
        let now = at(&Shanghai, 2024, 5, 20, 9, 0, 0);
        let timestamps = vec![
            ms(&Shanghai, 2024, 5, 20, 7, 30, 0),
            ms(&Shanghai, 2024, 5, 19, 22, 0, 0),
            ms(&Shanghai, 2024, 5, 18, 6, 0, 0),
            // gap on the 17th
            ms(&Shanghai, 2024, 5, 16, 6, 0, 0),
        ];

        let stats = compute_stats(timestamps, &now);
        assert_eq!(stats.continuous_days, 3);
        assert_eq!(stats.total_count, 4);
        assert_eq!(stats.this_month, 4);
    }

    #[test]
    fn test_missing_today_breaks_streak() {
        let now = at(&Shanghai, 2024, 5, 20, 23, 0, 0);
        let timestamps = vec![
            ms(&Shanghai, 2024, 5, 19, 8, 0, 0),
            ms(&Shanghai, 2024, 5, 18, 8, 0, 0),
        ];

        let stats = compute_stats(timestamps, &now);
        assert_eq!(stats.continuous_days, 0);
        assert_eq!(stats.total_count, 2);
    }

    #[test]
    fn test_multiple_checkins_same_day_count_once_for_streak() {
        let now = at(&Shanghai, 2024, 5, 20, 21, 0, 0);
        let timestamps = vec![
            ms(&Shanghai, 2024, 5, 20, 7, 0, 0),
            ms(&Shanghai, 2024, 5, 20, 12, 0, 0),
            ms(&Shanghai, 2024, 5, 20, 20, 0, 0),
            ms(&Shanghai, 2024, 5, 19, 20, 0, 0),
        ];

        let stats = compute_stats(timestamps, &now);
        assert_eq!(stats.continuous_days, 2);
        assert_eq!(stats.total_count, 4);
    }

    #[test]
    fn test_day_edges_are_inclusive() {
        let now = at(&Shanghai, 2024, 5, 20, 12, 0, 0);
        let timestamps = vec![
            // 00:00:00.000 today
            ms(&Shanghai, 2024, 5, 20, 0, 0, 0),
            // 23:59:59.999 yesterday
            ms(&Shanghai, 2024, 5, 20, 0, 0, 0) - 1,
        ];

        let stats = compute_stats(timestamps, &now);
        assert_eq!(stats.continuous_days, 2);
    }

    #[test]
    fn test_month_boundary() {
        let last_ms_of_january = ms(&Shanghai, 2024, 2, 1, 0, 0, 0) - 1;
        let first_ms_of_february = ms(&Shanghai, 2024, 2, 1, 0, 0, 0);
        let timestamps = vec![last_ms_of_january, first_ms_of_february];

        let in_february = compute_stats(timestamps.clone(), &at(&Shanghai, 2024, 2, 10, 9, 0, 0));
        assert_eq!(in_february.this_month, 1);

        let in_january = compute_stats(timestamps, &at(&Shanghai, 2024, 1, 31, 23, 59, 59));
        assert_eq!(in_january.this_month, 1);
    }

    #[test]
    fn test_month_rollover_december_to_january() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let timestamps = vec![
            ms(&tz, 2023, 12, 31, 23, 59, 59) + 999,
            ms(&tz, 2024, 1, 1, 0, 0, 0),
            ms(&tz, 2024, 1, 1, 8, 0, 0),
        ];

        let december = compute_stats(timestamps.clone(), &at(&tz, 2023, 12, 31, 12, 0, 0));
        assert_eq!(december.this_month, 1);

        let january = compute_stats(timestamps, &at(&tz, 2024, 1, 1, 9, 0, 0));
        assert_eq!(january.this_month, 2);
        assert_eq!(january.continuous_days, 2);
    }

    #[test]
    fn test_streak_across_leap_day() {
        let now = at(&Shanghai, 2024, 3, 1, 10, 0, 0);
        let timestamps = vec![
            ms(&Shanghai, 2024, 3, 1, 8, 0, 0),
            ms(&Shanghai, 2024, 2, 29, 8, 0, 0),
            ms(&Shanghai, 2024, 2, 28, 8, 0, 0),
        ];

        assert_eq!(compute_stats(timestamps, &now).continuous_days, 3);
    }

    #[test]
    fn test_streak_across_dst_transitions() {
        // 2024-03-10 is 23 hours long in New York.
        let now = at(&New_York, 2024, 3, 11, 12, 0, 0);
        let timestamps = vec![
            ms(&New_York, 2024, 3, 11, 9, 0, 0),
            ms(&New_York, 2024, 3, 10, 23, 30, 0),
            ms(&New_York, 2024, 3, 9, 0, 30, 0),
        ];
        assert_eq!(compute_stats(timestamps, &now).continuous_days, 3);

        // 2024-11-03 is 25 hours long; 23:30 still belongs to the 3rd.
        let now = at(&New_York, 2024, 11, 3, 23, 45, 0);
        let timestamps = vec![
            ms(&New_York, 2024, 11, 3, 23, 30, 0),
            ms(&New_York, 2024, 11, 2, 0, 10, 0),
        ];
        assert_eq!(compute_stats(timestamps, &now).continuous_days, 2);
    }

    #[test]
    fn test_streak_capped_at_365_days() {
        let now = at(&Shanghai, 2024, 6, 1, 12, 0, 0);
        let timestamps: Vec<i64> = (0..400)
            .map(|days| (now.clone() - Duration::days(days)).timestamp_millis())
            .collect();

        let stats = compute_stats(timestamps, &now);
        assert_eq!(stats.continuous_days, MAX_STREAK_DAYS);
        assert_eq!(stats.total_count, 400);
    }

    #[test]
    fn test_future_records_do_not_extend_streak() {
        let now = at(&Shanghai, 2024, 5, 20, 9, 0, 0);
        let timestamps = vec![ms(&Shanghai, 2024, 5, 21, 9, 0, 0)];

        let stats = compute_stats(timestamps, &now);
        assert_eq!(stats.continuous_days, 0);
        assert_eq!(stats.this_month, 1);
    }

    #[test]
    fn test_today_bounds() {
        let now = at(&Shanghai, 2024, 5, 20, 9, 0, 0);
        let (start, end) = today_bounds_ms(&now).unwrap();
        assert_eq!(start, ms(&Shanghai, 2024, 5, 20, 0, 0, 0));
        assert_eq!(end, ms(&Shanghai, 2024, 5, 21, 0, 0, 0) - 1);
    }

    #[test]
    fn test_timeline_range_lookups() {
        let timeline = CheckinTimeline::new(vec![30, 10, 20]);
        assert_eq!(timeline.count_in(10, 30), 2);
        assert_eq!(timeline.count_in(30, 10), 0);
        assert!(timeline.any_within(20, 20));
        assert!(!timeline.any_within(21, 29));
        assert!(!timeline.any_within(31, 100));
    }
}
