//! Finance totals and the 10 % rule.
//!
//! Entries are bucketed by the prefix of their category string:
//! `Income: Dad`, `Expense: Food`, `Invest: Gold`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::storage::FinanceEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinanceBucket {
    Income,
    Expense,
    Invest,
}

impl FinanceBucket {
    pub const ALL: [FinanceBucket; 3] = [Self::Income, Self::Expense, Self::Invest];

    pub fn prefix(self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
            Self::Invest => "Invest",
        }
    }

    /// Bucket for a stored category, by prefix.
    pub fn classify(category: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|bucket| category.starts_with(bucket.prefix()))
    }

    /// Category string as stored, e.g. `Expense: Food`.
    pub fn category(self, label: &str) -> String {
        format!("{}: {}", self.prefix(), label.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: f64,
}

/// Totals across every entry handed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FinanceSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub total_invested: f64,
    /// Invested as a share of income, 0 when there is no income.
    pub investment_rate: f64,
    /// Expenses as a share of income, 0 when there is no income.
    pub expense_ratio: f64,
    /// Biggest expense category by summed amount. Ties keep the category
    /// seen first.
    pub largest_expense: Option<CategoryTotal>,
}

impl FinanceSummary {
    pub fn from_entries(entries: &[FinanceEntry]) -> Self {
        let mut summary = Self::default();
        for entry in entries {
            match FinanceBucket::classify(&entry.category) {
                Some(FinanceBucket::Income) => summary.total_income += entry.amount,
                Some(FinanceBucket::Expense) => summary.total_expenses += entry.amount,
                Some(FinanceBucket::Invest) => summary.total_invested += entry.amount,
                None => {}
            }
        }
        summary.investment_rate = share_pct(summary.total_invested, summary.total_income);
        summary.expense_ratio = share_pct(summary.total_expenses, summary.total_income);

        summary.largest_expense =
            expense_breakdown(entries)
                .into_iter()
                .fold(None, |best: Option<CategoryTotal>, candidate| match best {
                    Some(b) if b.amount >= candidate.amount => Some(b),
                    _ => Some(candidate),
                });
        summary
    }

    pub fn meets_target(&self, target_rate: f64) -> bool {
        self.total_income > 0.0 && self.investment_rate >= target_rate
    }
}

/// `part / whole * 100`, 0 when `whole` is not positive.
pub fn share_pct(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Summed amount per expense category, in the order categories first appear.
pub fn expense_breakdown(entries: &[FinanceEntry]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    for entry in entries
        .iter()
        .filter(|e| FinanceBucket::classify(&e.category) == Some(FinanceBucket::Expense))
    {
        match totals.iter_mut().find(|t| t.category == entry.category) {
            Some(total) => total.amount += entry.amount,
            None => totals.push(CategoryTotal {
                category: entry.category.clone(),
                amount: entry.amount,
            }),
        }
    }
    totals
}

/// One day on the cumulative investment curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub cumulative: f64,
}

/// Running total of invested amounts per day, oldest first.
pub fn investment_trend(entries: &[FinanceEntry]) -> Vec<TrendPoint> {
    let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for entry in entries
        .iter()
        .filter(|e| FinanceBucket::classify(&e.category) == Some(FinanceBucket::Invest))
    {
        *per_day.entry(entry.date).or_default() += entry.amount;
    }

    let mut running = 0.0;
    per_day
        .into_iter()
        .map(|(date, amount)| {
            running += amount;
            TrendPoint {
                date,
                cumulative: running,
            }
        })
        .collect()
}
