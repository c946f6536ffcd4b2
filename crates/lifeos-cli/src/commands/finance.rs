//! Finance commands: the 10% rule.

use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};
use lifeos_core::dashboard::InvestmentStatus;
use lifeos_core::stats::{self, CategoryTotal, FinanceBucket, FinanceSummary, TrendPoint};
use lifeos_core::storage::FinanceEntry;
use lifeos_core::{Config, Database, ValidationError};
use serde::Serialize;

use super::{bar, today, CmdResult, Output};

#[derive(Clone, Copy, ValueEnum)]
pub enum Kind {
    Income,
    Expense,
    Invest,
}

impl From<Kind> for FinanceBucket {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Income => FinanceBucket::Income,
            Kind::Expense => FinanceBucket::Expense,
            Kind::Invest => FinanceBucket::Invest,
        }
    }
}

#[derive(Subcommand)]
pub enum FinanceAction {
    /// Record a transaction
    Add {
        kind: Kind,
        /// Source or type, e.g. "Freelance", "Food", "Nifty 50"
        label: String,
        amount: f64,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Totals, investment rate and largest expense
    Summary,
    /// Latest transactions
    Recent {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Expenses per category
    Breakdown,
    /// Cumulative investment per day
    Trend,
}

#[derive(Serialize)]
struct SummaryView {
    #[serde(flatten)]
    summary: FinanceSummary,
    target_rate: f64,
    status: String,
}

#[derive(Serialize)]
struct BreakdownRow {
    #[serde(flatten)]
    total: CategoryTotal,
    share_pct: f64,
}

pub fn run(action: FinanceAction, out: Output) -> CmdResult {
    let config = Config::load()?;
    let db = Database::open()?;
    let finance = &config.finance;

    match action {
        FinanceAction::Add {
            kind,
            label,
            amount,
            note,
            date,
        } => {
            let bucket = FinanceBucket::from(kind);
            let allowed = match bucket {
                FinanceBucket::Income => &finance.income_sources,
                FinanceBucket::Expense => &finance.expense_types,
                FinanceBucket::Invest => &finance.invest_types,
            };
            let label = label.trim();
            if !allowed.iter().any(|a| a == label) {
                return Err(ValidationError::InvalidValue {
                    field: "label".into(),
                    message: format!("'{label}' is not one of: {}", allowed.join(", ")),
                }
                .into());
            }
            let date = date.unwrap_or_else(today);
            let category = bucket.category(label);
            let id = db.add_finance_entry(date, &category, amount, note.as_deref())?;
            out.emit(
                &serde_json::json!({ "id": id, "date": date, "category": category, "amount": amount }),
                |_| println!("Added {category}: {amount:.2} on {date}"),
            )?;
        }
        FinanceAction::Summary => {
            let entries = db.get_all_finance()?;
            let summary = FinanceSummary::from_entries(&entries);
            let view = SummaryView {
                status: InvestmentStatus::new(summary.investment_rate, finance.target_rate)
                    .to_string(),
                target_rate: finance.target_rate,
                summary,
            };
            out.emit(&view, |v| {
                let s = &v.summary;
                println!("Total income:    {:.2}", s.total_income);
                println!("Total expenses:  {:.2} ({:.1}%)", s.total_expenses, s.expense_ratio);
                println!("Total invested:  {:.2}", s.total_invested);
                println!("Investment rate: {:.1}%  {}", s.investment_rate, v.status);
                if let Some(largest) = &s.largest_expense {
                    println!("Largest expense: {} ({:.2})", largest.category, largest.amount);
                }
            })?;
        }
        FinanceAction::Recent { limit } => {
            let entries = db.get_recent_finance(limit.unwrap_or(finance.recent_limit))?;
            out.emit(&entries, |entries: &Vec<FinanceEntry>| {
                if entries.is_empty() {
                    println!("No transactions yet.");
                }
                for e in entries {
                    match &e.note {
                        Some(note) => println!("{}  {:<24} {:>10.2}  {note}", e.date, e.category, e.amount),
                        None => println!("{}  {:<24} {:>10.2}", e.date, e.category, e.amount),
                    }
                }
            })?;
        }
        FinanceAction::Breakdown => {
            let entries = db.get_all_finance()?;
            let totals = stats::expense_breakdown(&entries);
            let all: f64 = totals.iter().map(|t| t.amount).sum();
            let rows: Vec<BreakdownRow> = totals
                .into_iter()
                .map(|total| BreakdownRow {
                    share_pct: stats::finance::share_pct(total.amount, all),
                    total,
                })
                .collect();
            out.emit(&rows, |rows: &Vec<BreakdownRow>| {
                if rows.is_empty() {
                    println!("No expenses yet.");
                }
                for r in rows {
                    println!(
                        "{:<24} {:>10.2} {:>5.1}% {}",
                        r.total.category,
                        r.total.amount,
                        r.share_pct,
                        bar(r.share_pct / 100.0, 20)
                    );
                }
            })?;
        }
        FinanceAction::Trend => {
            let entries = db.get_all_finance()?;
            let trend = stats::investment_trend(&entries);
            out.emit(&trend, |trend: &Vec<TrendPoint>| {
                if trend.is_empty() {
                    println!("No investments yet.");
                }
                for p in trend {
                    println!("{}  {:>10.2}", p.date, p.cumulative);
                }
            })?;
        }
    }
    Ok(())
}
