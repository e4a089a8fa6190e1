//! Plain text rendering of the dashboard for the command line client.

use std::{fmt::Write, sync::OnceLock};

use numfmt::{Formatter, Precision};
use time::{OffsetDateTime, macros::format_description};

use crate::{
    CategoryType, Identity, TransactionDetail,
    client::{Dashboard, summarize},
};

/// Format `number` as Rupiah rounded to the nearest whole number, e.g. "Rp 50,000".
pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("Rp ")
            .expect("currency prefix should be valid")
            .precision(Precision::Decimals(0))
    });

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-Rp ")
            .expect("currency prefix should be valid")
            .precision(Precision::Decimals(0))
    });

    let number = number.round();

    if number < 0.0 {
        negative_fmt.fmt_string(number.abs())
    } else if number > 0.0 {
        positive_fmt.fmt_string(number)
    } else {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        "Rp 0".to_owned()
    }
}

fn format_date(date: OffsetDateTime) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

fn signed_amount(amount: f64, kind: CategoryType) -> String {
    match kind {
        CategoryType::Income => format!("+{}", format_currency(amount)),
        CategoryType::Expense => format!("-{}", format_currency(amount)),
    }
}

/// Render the summary cards, the chart and the transaction table.
pub fn render_dashboard(identity: &Identity, dashboard: &Dashboard) -> String {
    let summary = summarize(&dashboard.transactions);
    let mut output = String::new();

    let _ = writeln!(output, "Welcome, {}", identity.name);
    let _ = writeln!(output);
    let _ = writeln!(output, "Income:   {}", format_currency(summary.total_income));
    let _ = writeln!(output, "Expenses: {}", format_currency(summary.total_expense));
    let _ = writeln!(output, "Balance:  {}", format_currency(summary.balance));
    let _ = writeln!(output);

    if summary.chart.is_empty() {
        let _ = writeln!(output, "No data for the chart yet.");
    } else {
        let total = summary.total_income + summary.total_expense;

        for slice in &summary.chart {
            let _ = writeln!(
                output,
                "{:<8} {:>5.1}% ({})",
                slice.label.to_string(),
                slice.percentage_of(total),
                slice.colour
            );
        }
    }

    let _ = writeln!(output);

    if dashboard.transactions.is_empty() {
        let _ = writeln!(output, "No transactions yet.");
        return output;
    }

    let _ = writeln!(
        output,
        "{:>5}  {:<10}  {:<24}  {:<16}  {:>18}  Receipt",
        "ID", "Date", "Description", "Category", "Amount"
    );

    for item in &dashboard.transactions {
        let transaction = &item.transaction;
        let _ = writeln!(
            output,
            "{:>5}  {:<10}  {:<24}  {:<16}  {:>18}  {}",
            transaction.id,
            format_date(transaction.date),
            transaction.description,
            item.category.name.as_ref(),
            signed_amount(transaction.amount, item.category.kind),
            if transaction.image_url.is_some() {
                "yes"
            } else {
                "-"
            }
        );
    }

    output
}

/// Render a single transaction. `receipt_url` is the full URL of its image, if it has one.
pub fn render_transaction(detail: &TransactionDetail, receipt_url: Option<&str>) -> String {
    let transaction = &detail.transaction;
    let mut output = String::new();

    let _ = writeln!(output, "Transaction #{}", transaction.id);
    let _ = writeln!(output, "Description: {}", transaction.description);
    let _ = writeln!(
        output,
        "Amount:      {}",
        signed_amount(transaction.amount, detail.category.kind)
    );
    let _ = writeln!(output, "Date:        {}", format_date(transaction.date));
    let _ = writeln!(
        output,
        "Category:    {} ({})",
        detail.category.name, detail.category.kind
    );
    let _ = writeln!(output, "Receipt:     {}", receipt_url.unwrap_or("none"));

    output
}

#[cfg(test)]
mod render_tests {
    use time::macros::datetime;

    use crate::{
        Category, CategoryName, CategorySummary, CategoryType, Email, Identity, Transaction,
        TransactionDetail, TransactionListItem, UserId, UserName,
        client::{Dashboard, render::render_transaction},
    };

    use super::{format_currency, render_dashboard};

    fn identity() -> Identity {
        Identity {
            id: UserId::new(1),
            name: UserName::new_unchecked("Alice"),
            email: Email::new_unchecked("alice@example.com"),
        }
    }

    fn transaction(image_url: Option<&str>) -> Transaction {
        Transaction {
            id: 7,
            amount: 50000.0,
            description: "Lunch".to_owned(),
            date: datetime!(2025-04-01 12:00 UTC),
            image_url: image_url.map(str::to_owned),
            category_id: 3,
            created_at: datetime!(2025-04-01 12:00 UTC),
        }
    }

    #[test]
    fn zero_is_formatted_without_sign() {
        assert_eq!(format_currency(0.0), "Rp 0");
        assert_eq!(format_currency(0.4), "Rp 0");
    }

    #[test]
    fn currency_has_rupiah_prefix() {
        assert!(format_currency(50000.0).starts_with("Rp "));
        assert!(format_currency(-50000.0).starts_with("-Rp "));
    }

    #[test]
    fn empty_dashboard_has_no_chart_or_table() {
        let output = render_dashboard(&identity(), &Dashboard::default());

        assert!(output.contains("Welcome, Alice"));
        assert!(output.contains("Balance:  Rp 0"));
        assert!(output.contains("No data for the chart yet."));
        assert!(output.contains("No transactions yet."));
    }

    #[test]
    fn dashboard_lists_transactions_and_chart() {
        let dashboard = Dashboard {
            categories: Vec::new(),
            transactions: vec![TransactionListItem {
                transaction: transaction(Some("uploads/image-1.jpg")),
                category: CategorySummary {
                    name: CategoryName::new_unchecked("Food"),
                    kind: CategoryType::Expense,
                },
            }],
        };

        let output = render_dashboard(&identity(), &dashboard);

        assert!(output.contains("Expense  100.0% (#dc3545)"));
        assert!(output.contains("Income     0.0% (#198754)"));
        assert!(output.contains("2025-04-01"));
        assert!(output.contains("Lunch"));
        assert!(output.contains("Food"));
        assert!(output.contains("yes"));
    }

    #[test]
    fn transaction_shows_receipt_url() {
        let detail = TransactionDetail {
            transaction: transaction(None),
            category: Category {
                id: 3,
                name: CategoryName::new_unchecked("Wages"),
                kind: CategoryType::Income,
                created_at: datetime!(2025-03-01 00:00 UTC),
            },
        };

        let without = render_transaction(&detail, None);
        let with = render_transaction(&detail, Some("http://localhost:5000/uploads/a.png"));

        assert!(without.contains("Receipt:     none"));
        assert!(without.contains("Wages (INCOME)"));
        assert!(with.contains("http://localhost:5000/uploads/a.png"));
    }
}
