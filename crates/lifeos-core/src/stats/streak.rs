//! Consecutive-day streak counting.
//!
//! A streak is the run of consecutive calendar days, ending at the most
//! recent day, on which something was done. A day marked not-done or a day
//! with no record at all ends the run.
//!
//! Two lookup shapes exist:
//! - [`dense_streak`] asks about every calendar day walking back from today
//!   (habits, where a row is seeded for each day that was shown).
//! - [`sparse_streak`] receives only the days on which something happened
//!   (focus sessions), and requires the first of them to be today.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of a done/not-done history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayMark {
    pub date: NaiveDate,
    pub done: bool,
}

impl DayMark {
    pub fn new(date: NaiveDate, done: bool) -> Self {
        Self { date, done }
    }
}

/// Streak over a history ordered by date, most recent first.
///
/// Counts from the first entry while entries are done and each date is
/// exactly one day before the previous one. Repeated dates count as a gap.
pub fn streak(history: &[DayMark]) -> u32 {
    let mut count = 0;
    let mut expected: Option<NaiveDate> = None;

    for mark in history {
        if !mark.done {
            break;
        }
        if expected.is_some_and(|day| day != mark.date) {
            break;
        }
        count += 1;
        match mark.date.pred_opt() {
            Some(prev) => expected = Some(prev),
            None => break,
        }
    }
    count
}

/// Streak ending at `today`, probing each calendar day through `lookup`.
///
/// `lookup` returns `None` when the day has no record, which ends the streak
/// the same way `Some(false)` does.
pub fn dense_streak<F>(today: NaiveDate, mut lookup: F) -> u32
where
    F: FnMut(NaiveDate) -> Option<bool>,
{
    let mut count = 0;
    let mut day = today;
    while lookup(day) == Some(true) {
        count += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    count
}

/// Streak ending at `today` over the distinct days that had activity,
/// most recent first.
pub fn sparse_streak(today: NaiveDate, days_desc: &[NaiveDate]) -> u32 {
    let mut count = 0;
    let mut current = today;
    for &day in days_desc {
        if day != current {
            break;
        }
        count += 1;
        match current.pred_opt() {
            Some(prev) => current = prev,
            None => break,
        }
    }
    count
}

/// Longest run of consecutive done days anywhere in the history.
///
/// Order of `history` does not matter. A day counts as done if any entry for
/// it is done.
pub fn longest_streak(history: &[DayMark]) -> u32 {
    let done_days: BTreeSet<NaiveDate> = history
        .iter()
        .filter(|mark| mark.done)
        .map(|mark| mark.date)
        .collect();

    let mut best = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in done_days {
        run = match previous {
            Some(prev) if prev.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(day);
    }
    best
}
