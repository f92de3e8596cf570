//! Month arithmetic for anchored resampling.

use chrono::{Datelike, NaiveDate};

/// Shifts a date by whole months, clamping the day to the target month's
/// length (Jan 31 - 1 month = Dec 31, Mar 31 - 1 month = Feb 28/29).
pub(crate) fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    let total = date.year() * 12 + date.month() as i32 - 1 + months;
    let year = total.div_euclid(12);
    let month = (total.rem_euclid(12) + 1) as u32;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 1).unwrap())
}

/// Calendar months from `earlier` to `later`, ignoring the day component.
pub(crate) fn months_between(earlier: NaiveDate, later: NaiveDate) -> i32 {
    (later.year() * 12 + later.month() as i32) - (earlier.year() * 12 + earlier.month() as i32)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        _ => 28,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
