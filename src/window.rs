//! Gap-filled daily series and period-over-period window comparisons.

use crate::error::{ConfigurationError, Result, StatementError};
use crate::ledger::Ledger;
use crate::utils::{days_between, days_in_range};
use chrono::{Days, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rolling windows shown by default, in days.
pub const DEFAULT_WINDOWS: [u32; 4] = [7, 15, 30, 180];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    /// 1-based offset from the start of the range.
    pub day_index: u32,
    pub daily_debit: f64,
    pub daily_credit: f64,
    pub cumulative_debit: f64,
    pub cumulative_credit: f64,
}

/// One row per calendar day of an inclusive range, days without transactions
/// included, with running debit and credit totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub points: Vec<DailyPoint>,
}

impl DailySeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn total_debit(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.cumulative_debit)
    }

    pub fn total_credit(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.cumulative_credit)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyPoint> {
        let offset = usize::try_from(days_between(self.start, date)).ok()?;
        self.points.get(offset)
    }
}

/// Builds the calendar skeleton of `[start, end]`, joins same-day sums of the
/// ledger onto it, zero-fills the gaps and accumulates.
pub fn daily_series(ledger: &Ledger, start: NaiveDate, end: NaiveDate) -> Result<DailySeries> {
    if end < start {
        return Err(StatementError::InvalidRange { start, end });
    }

    let mut per_day: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for tx in ledger.between(start, end) {
        let slot = per_day.entry(tx.date).or_insert((0.0, 0.0));
        slot.0 += tx.debit_or_zero();
        slot.1 += tx.credit_or_zero();
    }

    let mut cumulative_debit = 0.0;
    let mut cumulative_credit = 0.0;
    let points: Vec<DailyPoint> = days_in_range(start, end)
        .into_iter()
        .enumerate()
        .map(|(i, date)| {
            let (daily_debit, daily_credit) = per_day.get(&date).copied().unwrap_or((0.0, 0.0));
            cumulative_debit += daily_debit;
            cumulative_credit += daily_credit;
            DailyPoint {
                date,
                day_index: i as u32 + 1,
                daily_debit,
                daily_credit,
                cumulative_debit,
                cumulative_credit,
            }
        })
        .collect();

    Ok(DailySeries { start, end, points })
}

/// Totals of one quantity (expenses or earnings) across the two windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowDelta {
    pub current_total: f64,
    pub previous_total: f64,
    /// `current / previous - 1`; `None` when the previous total is zero.
    pub delta: Option<f64>,
}

impl WindowDelta {
    pub fn new(current_total: f64, previous_total: f64) -> Self {
        Self {
            current_total,
            previous_total,
            delta: percentage_delta(current_total, previous_total),
        }
    }

    pub fn delta_percent(&self) -> Option<f64> {
        self.delta.map(|d| d * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowComparison {
    pub window_days: u32,
    pub anchor: NaiveDate,
    pub current: DailySeries,
    pub previous: DailySeries,
    pub expenses: WindowDelta,
    pub earnings: WindowDelta,
}

/// Relative change of `current` against `previous`, undefined for a zero base.
pub fn percentage_delta(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return None;
    }
    Some(current / previous - 1.0)
}

/// Compares `[anchor - n, anchor]` with `[anchor - 2n, anchor - n]`.
pub fn window_comparison(
    ledger: &Ledger,
    window_days: u32,
    anchor: NaiveDate,
) -> Result<WindowComparison> {
    if window_days == 0 {
        return Err(ConfigurationError::InvalidWindow(window_days).into());
    }

    let span = Days::new(u64::from(window_days));
    let current_start = anchor
        .checked_sub_days(span)
        .ok_or(StatementError::InvalidRange {
            start: anchor,
            end: anchor,
        })?;
    let previous_start =
        current_start
            .checked_sub_days(span)
            .ok_or(StatementError::InvalidRange {
                start: current_start,
                end: current_start,
            })?;

    let current = daily_series(ledger, current_start, anchor)?;
    let previous = daily_series(ledger, previous_start, current_start)?;

    let expenses = WindowDelta::new(current.total_debit(), previous.total_debit());
    let earnings = WindowDelta::new(current.total_credit(), previous.total_credit());

    debug!(
        "{}-day window ending {}: expenses {:.2} vs {:.2}, earnings {:.2} vs {:.2}",
        window_days,
        anchor,
        expenses.current_total,
        expenses.previous_total,
        earnings.current_total,
        earnings.previous_total
    );

    Ok(WindowComparison {
        window_days,
        anchor,
        current,
        previous,
        expenses,
        earnings,
    })
}

/// One comparison per requested window length, all anchored at `anchor`.
pub fn rolling_comparisons(
    ledger: &Ledger,
    windows: &[u32],
    anchor: NaiveDate,
) -> Result<Vec<WindowComparison>> {
    windows
        .iter()
        .map(|&days| window_comparison(ledger, days, anchor))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Transaction;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn tx(date: NaiveDate, debit: Option<f64>, credit: Option<f64>) -> Transaction {
        Transaction {
            date,
            debit,
            credit,
            balance: None,
            category: "Test".to_string(),
            description: None,
            source_line: 0,
        }
    }

    #[test]
    fn test_staircase_cumulative_series() {
        let ledger = Ledger::from_transactions(vec![
            tx(d(2024, 3, 1), None, Some(1000.0)),
            tx(d(2024, 3, 3), Some(200.0), None),
        ]);

        let series = daily_series(&ledger, d(2024, 3, 1), d(2024, 3, 5)).unwrap();

        assert_eq!(series.len(), 5);
        assert_eq!(series.points[0].cumulative_debit, 0.0);
        assert_eq!(series.points[1].cumulative_debit, 0.0);
        assert_eq!(series.points[2].cumulative_debit, 200.0);
        assert_eq!(series.points[4].cumulative_debit, 200.0);
        assert_eq!(series.points[4].cumulative_credit, 1000.0);
        assert_eq!(series.points[3].daily_debit, 0.0);
        assert_eq!(series.get(d(2024, 3, 3)).unwrap().day_index, 3);
    }

    #[test]
    fn test_gap_fill_completeness() {
        let ledger = Ledger::from_transactions(vec![
            tx(d(2023, 12, 30), Some(5.0), None),
            tx(d(2024, 2, 29), Some(7.0), None),
        ]);
        let start = d(2023, 12, 1);
        let end = d(2024, 3, 10);

        let series = daily_series(&ledger, start, end).unwrap();

        assert_eq!(series.len() as i64, (end - start).num_days() + 1);
        for (i, point) in series.points.iter().enumerate() {
            assert_eq!(point.day_index as usize, i + 1);
        }
        for pair in series.points.windows(2) {
            assert!(pair[1].cumulative_debit >= pair[0].cumulative_debit);
            assert!(pair[1].cumulative_credit >= pair[0].cumulative_credit);
        }
        assert_eq!(series.total_debit(), 12.0);
    }

    #[test]
    fn test_same_day_transactions_are_summed() {
        let ledger = Ledger::from_transactions(vec![
            tx(d(2024, 1, 2), Some(3.0), None),
            tx(d(2024, 1, 2), Some(4.5), Some(1.0)),
            tx(d(2024, 1, 2), None, None),
        ]);
        let series = daily_series(&ledger, d(2024, 1, 2), d(2024, 1, 2)).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.points[0].daily_debit, 7.5);
        assert_eq!(series.points[0].daily_credit, 1.0);
    }

    #[test]
    fn test_transactions_outside_range_are_ignored() {
        let ledger = Ledger::from_transactions(vec![
            tx(d(2024, 1, 1), Some(100.0), None),
            tx(d(2024, 1, 10), Some(1.0), None),
        ]);
        let series = daily_series(&ledger, d(2024, 1, 5), d(2024, 1, 9)).unwrap();
        assert_eq!(series.total_debit(), 0.0);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let ledger = Ledger::default();
        let err = daily_series(&ledger, d(2024, 1, 5), d(2024, 1, 4)).unwrap_err();
        assert!(matches!(err, StatementError::InvalidRange { .. }));
    }

    #[test]
    fn test_zero_previous_total_has_undefined_delta() {
        let anchor = d(2024, 6, 30);
        let ledger = Ledger::from_transactions(vec![tx(d(2024, 6, 28), Some(50.0), None)]);

        let comparison = window_comparison(&ledger, 7, anchor).unwrap();

        assert_eq!(comparison.expenses.current_total, 50.0);
        assert_eq!(comparison.expenses.previous_total, 0.0);
        assert_eq!(comparison.expenses.delta, None);
        assert_eq!(comparison.earnings.delta, None);
    }

    #[test]
    fn test_window_comparison_delta() {
        let anchor = d(2024, 6, 30);
        let ledger = Ledger::from_transactions(vec![
            tx(d(2024, 6, 18), Some(40.0), Some(10.0)),
            tx(d(2024, 6, 27), Some(60.0), Some(5.0)),
        ]);

        let comparison = window_comparison(&ledger, 7, anchor).unwrap();

        assert_eq!(comparison.current.start, d(2024, 6, 23));
        assert_eq!(comparison.previous.start, d(2024, 6, 16));
        assert_eq!(comparison.previous.end, d(2024, 6, 23));
        assert_eq!(comparison.current.len(), 8);
        assert!((comparison.expenses.delta.unwrap() - 0.5).abs() < 1e-12);
        assert!((comparison.earnings.delta_percent().unwrap() + 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_length_window_is_rejected() {
        let err = window_comparison(&Ledger::default(), 0, d(2024, 1, 1)).unwrap_err();
        assert!(matches!(
            err,
            StatementError::Configuration(ConfigurationError::InvalidWindow(0))
        ));
    }

    #[test]
    fn test_rolling_comparisons_cover_each_window() {
        let comparisons =
            rolling_comparisons(&Ledger::default(), &DEFAULT_WINDOWS, d(2024, 1, 1)).unwrap();
        let lengths: Vec<u32> = comparisons.iter().map(|c| c.window_days).collect();
        assert_eq!(lengths, vec![7, 15, 30, 180]);
        assert_eq!(comparisons[3].current.len(), 181);
    }

    #[test]
    fn test_percentage_delta() {
        assert_eq!(percentage_delta(50.0, 0.0), None);
        assert_eq!(percentage_delta(0.0, 0.0), None);
        assert_eq!(percentage_delta(0.0, 10.0), Some(-1.0));
        assert_eq!(percentage_delta(20.0, 10.0), Some(1.0));
    }
}
