use crate::error::{ParseFailure, Result};
use crate::ingestion::{RawRecord, RawTable};
use crate::mapping::{ColumnMapping, Role};
use crate::normalize::{parse_amount, parse_date, NumberFormat};
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Label used when a row has no category text.
pub const UNCATEGORIZED: &str = "Uncategorized";

const MAX_RECORDED_ISSUES: usize = 50;

/// One normalized ledger row. `None` amounts are unreadable or absent cells
/// and are distinct from a confirmed `Some(0.0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub debit: Option<f64>,
    pub credit: Option<f64>,
    pub balance: Option<f64>,
    pub category: String,
    pub description: Option<String>,
    /// Line of the source file this row came from.
    pub source_line: usize,
}

impl Transaction {
    /// Debit as a contribution to sums: missing counts as zero.
    pub fn debit_or_zero(&self) -> f64 {
        self.debit.unwrap_or(0.0)
    }

    pub fn credit_or_zero(&self) -> f64 {
        self.credit.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellIssue {
    pub line: usize,
    pub role: Role,
    pub raw: String,
    pub reason: String,
}

/// Counts of what the builder dropped or could not read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerDiagnostics {
    pub total_rows: usize,
    pub empty_rows: usize,
    pub invalid_date_rows: usize,
    pub malformed_amounts: usize,
    pub blank_amounts: usize,
    /// First few cell problems, for showing the user what went wrong.
    pub issues: Vec<CellIssue>,
}

impl LedgerDiagnostics {
    pub fn dropped_rows(&self) -> usize {
        self.empty_rows + self.invalid_date_rows
    }

    pub fn has_problems(&self) -> bool {
        self.invalid_date_rows > 0 || self.malformed_amounts > 0
    }

    fn record(&mut self, line: usize, role: Role, failure: ParseFailure) {
        if self.issues.len() < MAX_RECORDED_ISSUES {
            self.issues.push(CellIssue {
                line,
                role,
                raw: failure.raw,
                reason: failure.reason,
            });
        }
    }
}

/// Chronologically ordered, immutable transactions of one uploaded statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "LedgerRows")]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

/// Serialized shape of a [`Ledger`]; deserializing re-sorts by date.
#[derive(Deserialize)]
struct LedgerRows {
    transactions: Vec<Transaction>,
}

impl From<LedgerRows> for Ledger {
    fn from(rows: LedgerRows) -> Self {
        Ledger::from_transactions(rows.transactions)
    }
}

impl Ledger {
    /// Builds a ledger from already-sorted or unsorted transactions; a stable
    /// sort by date is applied.
    pub fn from_transactions(mut transactions: Vec<Transaction>) -> Self {
        transactions.sort_by_key(|t| t.date);
        Self { transactions }
    }

    /// Validates the mapping against the table headers, then normalizes every
    /// row. Cell-level failures end up in the diagnostics, never as errors.
    pub fn build(table: &RawTable, mapping: &ColumnMapping) -> Result<(Ledger, LedgerDiagnostics)> {
        mapping.validate(&table.headers)?;
        LedgerBuilder::new(mapping).build(&table.rows)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.transactions.first().map(|t| t.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.transactions.last().map(|t| t.date)
    }

    /// Transactions dated within `[start, end]`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> &[Transaction] {
        let lo = self.transactions.partition_point(|t| t.date < start);
        let hi = self.transactions.partition_point(|t| t.date <= end);
        if lo >= hi {
            &[]
        } else {
            &self.transactions[lo..hi]
        }
    }

    pub fn total_debit(&self) -> f64 {
        self.transactions.iter().map(Transaction::debit_or_zero).sum()
    }

    pub fn total_credit(&self) -> f64 {
        self.transactions.iter().map(Transaction::credit_or_zero).sum()
    }

    /// Reported running balance per transaction, for rows that carry one.
    pub fn balance_series(&self) -> Vec<(NaiveDate, f64)> {
        self.transactions
            .iter()
            .filter_map(|t| t.balance.map(|b| (t.date, b)))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.transactions.iter()
    }
}

pub struct LedgerBuilder<'a> {
    mapping: &'a ColumnMapping,
    number_format: NumberFormat,
}

impl<'a> LedgerBuilder<'a> {
    /// The mapping is assumed to be validated; see [`Ledger::build`].
    pub fn new(mapping: &'a ColumnMapping) -> Self {
        Self {
            mapping,
            number_format: mapping.number_format(),
        }
    }

    pub fn build(&self, rows: &[RawRecord]) -> Result<(Ledger, LedgerDiagnostics)> {
        let mut diagnostics = LedgerDiagnostics {
            total_rows: rows.len(),
            ..Default::default()
        };
        let mut transactions = Vec::with_capacity(rows.len());

        for row in rows {
            if self.is_empty_row(row) {
                diagnostics.empty_rows += 1;
                continue;
            }

            let raw_date = row.get(&self.mapping.date_field).unwrap_or("");
            let date = match parse_date(raw_date, &self.mapping.date_format) {
                Ok(date) => date,
                Err(failure) => {
                    diagnostics.invalid_date_rows += 1;
                    diagnostics.record(row.line, Role::Date, failure);
                    continue;
                }
            };

            let debit = self.read_amount(row, Role::Debit, &mut diagnostics);
            let credit = self.read_amount(row, Role::Credit, &mut diagnostics);
            let balance = self.read_amount(row, Role::Balance, &mut diagnostics);

            let category = row
                .get(&self.mapping.category_field)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(UNCATEGORIZED)
                .to_string();

            let description = self
                .mapping
                .description_field
                .as_deref()
                .and_then(|field| row.get(field))
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string);

            transactions.push(Transaction {
                date,
                debit,
                credit,
                balance,
                category,
                description,
                source_line: row.line,
            });
        }

        if diagnostics.invalid_date_rows > 0 {
            warn!(
                "Dropped {} row(s) whose date did not match '{}'",
                diagnostics.invalid_date_rows, self.mapping.date_format
            );
        }
        if diagnostics.malformed_amounts > 0 {
            warn!(
                "{} amount cell(s) could not be read and are treated as missing",
                diagnostics.malformed_amounts
            );
        }

        let ledger = Ledger::from_transactions(transactions);
        info!(
            "Built ledger with {} transaction(s) from {} row(s)",
            ledger.len(),
            diagnostics.total_rows
        );
        debug!("Ledger diagnostics: {:?}", diagnostics);

        Ok((ledger, diagnostics))
    }

    fn field(&self, role: Role) -> Option<&str> {
        match role {
            Role::Date => Some(self.mapping.date_field.as_str()),
            Role::Debit => Some(self.mapping.debit_field.as_str()),
            Role::Credit => Some(self.mapping.credit_field.as_str()),
            Role::Category => Some(self.mapping.category_field.as_str()),
            Role::Balance => self.mapping.balance_field.as_deref(),
            Role::Description => self.mapping.description_field.as_deref(),
        }
    }

    fn is_empty_row(&self, row: &RawRecord) -> bool {
        self.mapping
            .bindings()
            .iter()
            .all(|(_, column)| row.get(column).map_or(true, |v| v.trim().is_empty()))
    }

    fn read_amount(
        &self,
        row: &RawRecord,
        role: Role,
        diagnostics: &mut LedgerDiagnostics,
    ) -> Option<f64> {
        let raw = self.field(role).and_then(|f| row.get(f))?;

        match parse_amount(raw, self.number_format) {
            Ok(value) => Some(value),
            Err(failure) => {
                if raw.trim().is_empty() {
                    diagnostics.blank_amounts += 1;
                } else {
                    diagnostics.malformed_amounts += 1;
                    diagnostics.record(row.line, role, failure);
                }
                None
            }
        }
    }
}
