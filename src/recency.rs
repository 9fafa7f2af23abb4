//! Trailing calendar-day window over pattern signals.
//!
//! A hit on `date` is recent when `0 <= anchor - date < window_days`, counted
//! in calendar days. Weekends and holidays therefore shrink the number of
//! trading days the window covers. Dates after the anchor are never recent.

use chrono::NaiveDate;

/// Default window, in calendar days
pub const DEFAULT_WINDOW_DAYS: u32 = 5;

/// Dates of nonzero signals inside the window, in bar order.
///
/// `signals` and `dates` are zipped; extra entries on either side are ignored.
pub fn select_recent(
    signals: &[i32],
    dates: &[NaiveDate],
    window_days: u32,
    anchor: NaiveDate,
) -> Vec<NaiveDate> {
    signals
        .iter()
        .zip(dates)
        .filter(|&(&signal, &date)| signal != 0 && is_recent(date, window_days, anchor))
        .map(|(_, &date)| date)
        .collect()
}

#[inline]
pub fn is_recent(date: NaiveDate, window_days: u32, anchor: NaiveDate) -> bool {
    let age = anchor.signed_duration_since(date).num_days();
    (0..i64::from(window_days)).contains(&age)
}
