use crate::ledger::{Ledger, Transaction};
use crate::summary::{running_totals, CumulativePoint};
use crate::utils::YearMonth;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMonthTotal {
    pub month: YearMonth,
    pub category: String,
    pub total_debit: f64,
}

/// Total debit per distinct category. Missing debits count as zero, so a
/// category made only of credits still appears with `0.0`.
pub fn totals_by_category(ledger: &Ledger) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for tx in ledger {
        *totals.entry(tx.category.clone()).or_insert(0.0) += tx.debit_or_zero();
    }
    totals
}

/// Total debit per (month, category) combination present in the ledger.
pub fn totals_by_category_by_month(ledger: &Ledger) -> BTreeMap<(YearMonth, String), f64> {
    let mut totals: BTreeMap<(YearMonth, String), f64> = BTreeMap::new();
    for tx in ledger {
        *totals
            .entry((YearMonth::of(tx.date), tx.category.clone()))
            .or_insert(0.0) += tx.debit_or_zero();
    }
    totals
}

/// Flattened form of [`totals_by_category_by_month`], ordered by month then
/// category, for serialization.
pub fn category_month_rows(ledger: &Ledger) -> Vec<CategoryMonthTotal> {
    totals_by_category_by_month(ledger)
        .into_iter()
        .map(|((month, category), total_debit)| CategoryMonthTotal {
            month,
            category,
            total_debit,
        })
        .collect()
}

/// Transactions whose debit exceeds `threshold`, largest first. Equal debits
/// keep ledger order.
pub fn transactions_above_average(ledger: &Ledger, threshold: f64) -> Vec<Transaction> {
    let mut outliers: Vec<Transaction> = ledger
        .iter()
        .filter(|t| t.debit.is_some_and(|d| d > threshold))
        .cloned()
        .collect();
    outliers.sort_by(|a, b| {
        b.debit_or_zero()
            .partial_cmp(&a.debit_or_zero())
            .unwrap_or(Ordering::Equal)
    });
    outliers
}

/// Each category's own running debit and credit totals over time.
pub fn cumulative_totals_by_category(ledger: &Ledger) -> BTreeMap<String, Vec<CumulativePoint>> {
    let mut grouped: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
    for tx in ledger {
        grouped.entry(tx.category.as_str()).or_default().push(tx);
    }
    grouped
        .into_iter()
        .map(|(category, txs)| (category.to_string(), running_totals(txs.into_iter())))
        .collect()
}
