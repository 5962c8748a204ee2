//! Month totals, expense averages, salary heuristics and period grouping.

use crate::ledger::{Ledger, Transaction};
use crate::utils::{YearMonth, AVERAGE_DAYS_PER_MONTH};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_MONTHLY_SAVINGS: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthTotals {
    pub month: YearMonth,
    pub earnings: f64,
    pub expenses: f64,
    pub balance: f64,
}

/// Earnings, expenses and their difference for the calendar month of
/// `reference_date`. Missing amounts contribute zero.
pub fn current_month_totals(ledger: &Ledger, reference_date: NaiveDate) -> MonthTotals {
    let month = YearMonth::of(reference_date);
    let (earnings, expenses) = ledger
        .iter()
        .filter(|t| month.contains(t.date))
        .fold((0.0, 0.0), |(e, x), t| {
            (e + t.credit_or_zero(), x + t.debit_or_zero())
        });

    MonthTotals {
        month,
        earnings,
        expenses,
        balance: earnings - expenses,
    }
}

/// Mean of the debit amounts that were actually read; missing debits are
/// left out of the mean rather than counted as zero.
pub fn average_daily_expense(ledger: &Ledger) -> Option<f64> {
    let debits: Vec<f64> = ledger.iter().filter_map(|t| t.debit).collect();
    if debits.is_empty() {
        return None;
    }
    Some(debits.iter().sum::<f64>() / debits.len() as f64)
}

pub fn average_monthly_expense(ledger: &Ledger) -> Option<f64> {
    average_daily_expense(ledger).map(|avg| avg * AVERAGE_DAYS_PER_MONTH)
}

pub fn recommended_salary(avg_monthly_expense: f64, desired_monthly_savings: f64) -> f64 {
    avg_monthly_expense + desired_monthly_savings
}

/// Savings as a percentage of the average monthly expense.
pub fn savings_share_percent(
    avg_monthly_expense: f64,
    desired_monthly_savings: f64,
) -> Option<f64> {
    if avg_monthly_expense == 0.0 {
        return None;
    }
    Some(desired_monthly_savings / avg_monthly_expense * 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
}

/// Yearly salary band derived from a monthly budget (earnings - expenses).
pub fn recommended_salary_range(monthly_budget: f64) -> SalaryRange {
    SalaryRange {
        min: monthly_budget * 12.0 * 1.2,
        max: monthly_budget * 12.0 * 1.5,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Day,
    /// ISO week, keyed by its Monday.
    Week,
    Month,
    Year,
}

impl Period {
    /// First day of the period containing `date`.
    pub fn start_of(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Day => date,
            Period::Week => {
                let back = u64::from(date.weekday().num_days_from_monday());
                date.checked_sub_days(chrono::Days::new(back)).unwrap_or(date)
            }
            Period::Month => date.with_day(1).unwrap_or(date),
            Period::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub earnings: f64,
    pub expenses: f64,
    pub transactions: usize,
}

impl PeriodTotals {
    fn add(&mut self, tx: &Transaction) {
        self.earnings += tx.credit_or_zero();
        self.expenses += tx.debit_or_zero();
        self.transactions += 1;
    }

    pub fn net(&self) -> f64 {
        self.earnings - self.expenses
    }
}

/// Totals per period, keyed by the first day of each period present.
pub fn group_by_time(ledger: &Ledger, period: Period) -> BTreeMap<NaiveDate, PeriodTotals> {
    let mut groups: BTreeMap<NaiveDate, PeriodTotals> = BTreeMap::new();
    for tx in ledger {
        groups.entry(period.start_of(tx.date)).or_default().add(tx);
    }
    groups
}

/// Earnings and expenses per calendar month present in the ledger.
pub fn monthly_totals(ledger: &Ledger) -> BTreeMap<YearMonth, PeriodTotals> {
    let mut months: BTreeMap<YearMonth, PeriodTotals> = BTreeMap::new();
    for tx in ledger {
        months.entry(YearMonth::of(tx.date)).or_default().add(tx);
    }
    months
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
    pub date: NaiveDate,
    pub cumulative_debit: f64,
    pub cumulative_credit: f64,
}

/// Running debit and credit totals, one point per transaction in ledger order.
pub fn cumulative_totals(ledger: &Ledger) -> Vec<CumulativePoint> {
    running_totals(ledger.iter())
}

pub(crate) fn running_totals<'a>(
    transactions: impl Iterator<Item = &'a Transaction>,
) -> Vec<CumulativePoint> {
    let mut debit = 0.0;
    let mut credit = 0.0;
    transactions
        .map(|t| {
            debit += t.debit_or_zero();
            credit += t.credit_or_zero();
            CumulativePoint {
                date: t.date,
                cumulative_debit: debit,
                cumulative_credit: credit,
            }
        })
        .collect()
}

/// For every month present, the running sum of that month's daily expenses,
/// one point per day that had transactions.
pub fn cumulative_daily_expenses_by_month(
    ledger: &Ledger,
) -> BTreeMap<YearMonth, Vec<(NaiveDate, f64)>> {
    let daily = group_by_time(ledger, Period::Day);
    let mut months: BTreeMap<YearMonth, Vec<(NaiveDate, f64)>> = BTreeMap::new();

    for (date, totals) in daily {
        let series = months.entry(YearMonth::of(date)).or_default();
        let running = series.last().map_or(0.0, |(_, v)| *v) + totals.expenses;
        series.push((date, running));
    }

    months
}
