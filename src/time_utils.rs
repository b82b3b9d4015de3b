// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and calendar windows.
//!
//! Day and month boundaries are derived from calendar dates in the target
//! time zone, never by dividing timestamps, so days that are 23 or 25 hours
//! long around DST transitions come out right.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};

/// Granularity used to step over a DST gap at the start of a day.
const GAP_STEP_MINUTES: u32 = 15;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time formatted for `created_at`/`updated_at` fields.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// First instant whose local date in `tz` is `date`.
///
/// Usually local midnight; when midnight falls inside a DST gap this is the
/// first local time that exists on that date.
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Tz>> {
    (0..24 * 60)
        .step_by(GAP_STEP_MINUTES as usize)
        .find_map(|minute| {
            let time = NaiveTime::from_hms_opt(minute / 60, minute % 60, 0)?;
            tz.from_local_datetime(&date.and_time(time)).earliest()
        })
}

/// Millisecond bounds `[start, end]` (both inclusive) of `date` in `tz`.
///
/// `end` is one millisecond before the start of the following day, i.e.
/// 23:59:59.999 on an ordinary day.
pub fn day_bounds_ms<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<(i64, i64)> {
    let start = start_of_day(tz, date)?;
    let next = start_of_day(tz, date.checked_add_days(Days::new(1))?)?;
    Some((start.timestamp_millis(), next.timestamp_millis() - 1))
}

/// Millisecond bounds `[start, end)` of the calendar month containing `now`.
pub fn month_bounds_ms<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<(i64, i64)> {
    let tz = now.timezone();
    let local = now.date_naive();
    let first = NaiveDate::from_ymd_opt(local.year(), local.month(), 1)?;
    let next_first = if local.month() == 12 {
        NaiveDate::from_ymd_opt(local.year() + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(local.year(), local.month() + 1, 1)?
    };

    let start = start_of_day(&tz, first)?;
    let end = start_of_day(&tz, next_first)?;
    Some((start.timestamp_millis(), end.timestamp_millis()))
}
