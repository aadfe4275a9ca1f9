use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Cents, Transaction};

pub use crate::domain::{IncomeExpenseTotals, income_expense_totals};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: Cents,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePoint {
    pub date: DateTime<Utc>,
    pub balance: Cents,
}

/// Time window applied to a balance history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryWindow {
    #[default]
    All,
    Week,
    Month,
}

impl HistoryWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryWindow::All => "all",
            HistoryWindow::Week => "week",
            HistoryWindow::Month => "month",
        }
    }

    /// Earliest date kept by this window, or `None` when nothing is cut.
    pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            HistoryWindow::All => None,
            HistoryWindow::Week => Some(now - Duration::days(7)),
            HistoryWindow::Month => now.checked_sub_months(Months::new(1)),
        }
    }
}

impl std::str::FromStr for HistoryWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(HistoryWindow::All),
            "week" | "weekly" => Ok(HistoryWindow::Week),
            "month" | "monthly" => Ok(HistoryWindow::Month),
            _ => Err(format!("unknown period: {} (expected all, week or month)", s)),
        }
    }
}

/// Expenses grouped by category, in order of first appearance.
pub fn expense_breakdown(transactions: &[Transaction]) -> Vec<CategorySummary> {
    let mut summaries: Vec<CategorySummary> = Vec::new();

    for tx in transactions.iter().filter(|tx| tx.is_expense()) {
        match summaries.iter_mut().find(|s| s.category == tx.category) {
            Some(summary) => {
                summary.total = summary.total.saturating_add(tx.amount_cents);
                summary.count += 1;
            }
            None => summaries.push(CategorySummary {
                category: tx.category.clone(),
                total: tx.amount_cents,
                count: 1,
                percentage: 0.0,
            }),
        }
    }

    let grand_total = breakdown_total(&summaries);
    if grand_total > 0 {
        for summary in &mut summaries {
            summary.percentage = summary.total as f64 / grand_total as f64 * 100.0;
        }
    }

    summaries
}

/// Sum of the category totals, saturating at the cent range.
pub fn breakdown_total(summaries: &[CategorySummary]) -> Cents {
    summaries
        .iter()
        .fold(0, |total: Cents, s| total.saturating_add(s.total))
}

/// Running balance over the transactions sorted by date, starting from zero.
/// Transactions sharing a date keep their insertion order. With no
/// transactions the history is a single point holding `current_balance`.
pub fn balance_history(
    transactions: &[Transaction],
    current_balance: Cents,
    now: DateTime<Utc>,
) -> Vec<BalancePoint> {
    if transactions.is_empty() {
        return vec![BalancePoint {
            date: now,
            balance: current_balance,
        }];
    }

    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by_key(|tx| tx.date);

    let mut running: Cents = 0;
    sorted
        .into_iter()
        .map(|tx| {
            running = running.saturating_add(tx.signed_amount());
            BalancePoint {
                date: tx.date,
                balance: running,
            }
        })
        .collect()
}

/// Keep the points that fall inside `window`, measured back from `now`.
pub fn filter_history(
    points: &[BalancePoint],
    window: HistoryWindow,
    now: DateTime<Utc>,
) -> Vec<BalancePoint> {
    match window.start(now) {
        None => points.to_vec(),
        Some(start) => points.iter().filter(|p| p.date >= start).copied().collect(),
    }
}
