//! Done/total counting for tasks and habits.

use std::iter::Sum;

use serde::{Deserialize, Serialize};

use crate::storage::{HabitRecord, TaskRecord};

/// Whole-number percentage, rounded down; 0 when `total` is 0.
pub fn percent(completed: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let pct = u128::from(completed) * 100 / u128::from(total);
    u32::try_from(pct).unwrap_or(u32::MAX)
}

/// How many of a set of items are done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Completion {
    pub completed: u64,
    pub total: u64,
    pub percent: u32,
}

impl Completion {
    pub fn new(completed: u64, total: u64) -> Self {
        Self {
            completed,
            total,
            percent: percent(completed, total),
        }
    }

    pub fn from_flags<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let (completed, total) = flags
            .into_iter()
            .fold((0, 0), |(done, all), flag| (done + u64::from(flag), all + 1));
        Self::new(completed, total)
    }

    pub fn of_tasks(tasks: &[TaskRecord]) -> Self {
        Self::from_flags(tasks.iter().map(|t| t.done))
    }

    pub fn of_habits(habits: &[HabitRecord]) -> Self {
        Self::from_flags(habits.iter().map(|h| h.done))
    }

    /// Everything done, and there was at least one item.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }

    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.completed)
    }

    /// Fraction in 0.0..=1.0 for progress bars.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

impl Sum for Completion {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let (completed, total) = iter.fold((0, 0), |(done, all), c| {
            (done + c.completed, all + c.total)
        });
        Self::new(completed, total)
    }
}
