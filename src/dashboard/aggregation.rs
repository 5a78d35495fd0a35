//! Transaction data aggregation for the dashboard.
//!
//! Provides pure functions that turn a transaction list into per-category
//! monthly totals keyed to a shared month axis, ready for charting and
//! forecasting.

use std::collections::{HashMap, HashSet};

use time::Date;

use crate::transaction::Transaction;

/// Extracts unique months from transactions and returns them in chronological order.
///
/// # Returns
/// Vector of unique months (as Dates with day=1) sorted chronologically.
pub(super) fn get_sorted_months(transactions: &[Transaction]) -> Vec<Date> {
    let mut months = HashSet::new();

    for transaction in transactions {
        let month = transaction.date.replace_day(1).unwrap();
        months.insert(month);
    }

    let mut sorted: Vec<_> = months.into_iter().collect();
    sorted.sort();
    sorted
}

/// Formats month dates as zero-padded "YYYY-MM" labels.
pub(super) fn format_month_labels(months: &[Date]) -> Vec<String> {
    months
        .iter()
        .map(|month| format!("{:04}-{:02}", month.year(), u8::from(month.month())))
        .collect()
}

/// The "YYYY-MM" label of the calendar month after the last observed month.
///
/// Returns `None` when no months have been observed.
pub(super) fn next_month_label(sorted_months: &[Date]) -> Option<String> {
    let last = sorted_months.last()?;

    let (year, month) = match u8::from(last.month()) {
        12 => (last.year() + 1, 1),
        month => (last.year(), month + 1),
    };

    Some(format!("{year:04}-{month:02}"))
}

/// Groups transaction amounts by category and calculates monthly totals.
///
/// Categories are ordered by descending total spend; ties keep the order in
/// which each category first appears in `transactions`.
///
/// # Arguments
/// * `transactions` - All transactions to analyze
/// * `sorted_months` - The months to include in the output (determines chart x-axis)
///
/// # Returns
/// Vector of (category, monthly_values) tuples where monthly_values has one
/// entry per month in `sorted_months`, with 0.0 for months with no spending.
pub(super) fn monthly_spending_by_category(
    transactions: &[Transaction],
    sorted_months: &[Date],
) -> Vec<(String, Vec<f64>)> {
    let mut totals_by_category: HashMap<&str, HashMap<Date, f64>> = HashMap::new();
    let mut categories: Vec<&str> = Vec::new();

    for transaction in transactions {
        let category = transaction.category.as_str();
        if !totals_by_category.contains_key(category) {
            categories.push(category);
        }

        let month = transaction.date.replace_day(1).unwrap();
        *totals_by_category
            .entry(category)
            .or_default()
            .entry(month)
            .or_insert(0.0) += transaction.amount;
    }

    let total_spend = |category: &str| totals_by_category[category].values().sum::<f64>();
    categories.sort_by(|a, b| total_spend(b).total_cmp(&total_spend(a)));

    categories
        .into_iter()
        .map(|category| {
            let monthly_totals = &totals_by_category[category];
            let values = sorted_months
                .iter()
                .map(|month| monthly_totals.get(month).copied().unwrap_or(0.0))
                .collect();

            (category.to_owned(), values)
        })
        .collect()
}
