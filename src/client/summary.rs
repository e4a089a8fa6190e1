//! Totals and chart data derived from a list of transactions.

use std::fmt::Display;

use crate::{CategoryType, TransactionListItem};

/// The colour of the income slice of the chart.
pub const INCOME_COLOUR: &str = "#198754";
/// The colour of the expense slice of the chart.
pub const EXPENSE_COLOUR: &str = "#dc3545";

/// Which total a chart slice shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceLabel {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl Display for SliceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SliceLabel::Income => write!(f, "Income"),
            SliceLabel::Expense => write!(f, "Expense"),
        }
    }
}

/// One slice of the income versus expense chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSlice {
    /// What the slice shows.
    pub label: SliceLabel,
    /// The total amount for the slice.
    pub value: f64,
    /// The hex colour the slice is drawn in.
    pub colour: &'static str,
}

impl ChartSlice {
    /// The share of `total` that this slice takes up, as a percentage.
    pub fn percentage_of(&self, total: f64) -> f64 {
        if total > 0.0 {
            self.value / total * 100.0
        } else {
            0.0
        }
    }
}

/// The totals shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    /// The sum of all income transactions.
    pub total_income: f64,
    /// The sum of all expense transactions.
    pub total_expense: f64,
    /// Income minus expenses.
    pub balance: f64,
    /// The income and expense slices, or nothing if both totals are zero.
    pub chart: Vec<ChartSlice>,
}

/// Add up the income and expenses in `transactions`.
pub fn summarize(transactions: &[TransactionListItem]) -> Summary {
    let (total_income, total_expense) =
        transactions
            .iter()
            .fold((0.0, 0.0), |(income, expense), item| match item.category.kind {
                CategoryType::Income => (income + item.transaction.amount, expense),
                CategoryType::Expense => (income, expense + item.transaction.amount),
            });

    let chart = if total_income == 0.0 && total_expense == 0.0 {
        Vec::new()
    } else {
        vec![
            ChartSlice {
                label: SliceLabel::Income,
                value: total_income,
                colour: INCOME_COLOUR,
            },
            ChartSlice {
                label: SliceLabel::Expense,
                value: total_expense,
                colour: EXPENSE_COLOUR,
            },
        ]
    };

    Summary {
        total_income,
        total_expense,
        balance: total_income - total_expense,
        chart,
    }
}
