//! Streaks and progress figures shown on every dashboard page.
//!
//! Everything here is a pure function of records already loaded from
//! [`crate::storage::Database`].

pub mod completion;
pub mod finance;
pub mod streak;

pub use completion::{percent, Completion};
pub use finance::{
    expense_breakdown, investment_trend, CategoryTotal, FinanceBucket, FinanceSummary, TrendPoint,
};
pub use streak::{dense_streak, longest_streak, sparse_streak, streak, DayMark};
