//! # Bank Statement Analyzer
//!
//! A library for turning heterogeneous bank-statement exports (CSV/TSV with
//! locale-specific numbers, dates and encodings) into a canonical ledger, and
//! for deriving gap-filled daily series and period-over-period summaries from it.
//!
//! ## Core Concepts
//!
//! - **Ledger**: immutable, chronologically sorted normalized transactions of one upload
//! - **Column Mapping**: user-declared binding of raw columns to date/debit/credit/balance/category
//! - **Daily Series**: one row per calendar day, empty days included, with running totals
//! - **Window Comparison**: the last N days against the N days before, as a relative delta
//! - **Diagnostics**: counts of dropped rows and unreadable cells; bad cells never become zero
//!
//! ## Example
//!
//! ```rust,no_run
//! use bank_statement_analyzer::*;
//!
//! let bytes = std::fs::read("statement.csv").unwrap();
//! let config = AnalyzerConfig::new(
//!     ColumnMapping::new("Date", "Debit", "Credit", "Category").with_balance("Balance"),
//! )
//! .with_skip_rows(4);
//!
//! let report = StatementAnalyzer::analyze(&bytes, &config).unwrap();
//! println!(
//!     "This month: +{:.2} / -{:.2}",
//!     report.current_month.earnings, report.current_month.expenses
//! );
//! for window in &report.windows {
//!     println!("{} days: {:?}", window.window_days, window.expenses.delta_percent());
//! }
//! ```

pub mod categories;
pub mod detect;
pub mod error;
pub mod ingestion;
pub mod ledger;
pub mod mapping;
pub mod narrative;
pub mod normalize;
pub mod report;
pub mod schema;
pub mod summary;
pub mod utils;
pub mod window;

#[cfg(feature = "openai")]
pub mod llm;

pub use categories::*;
pub use detect::{
    decode_statement, detect_encoding, sniff_delimiter, DecodedStatement, DetectionMethod,
    EncodingGuess,
};
pub use error::{ConfigurationError, ParseFailure, Result, ServiceError, StatementError};
pub use ingestion::*;
pub use ledger::{Ledger, LedgerBuilder, LedgerDiagnostics, Transaction, UNCATEGORIZED};
pub use mapping::{list_columns, ColumnMapping, Role};
pub use narrative::{NarrativeService, NarrativeStatus};
pub use normalize::{format_amount, parse_amount, parse_date, NumberFormat};
pub use report::{SessionState, StatementAnalyzer, StatementReport};
pub use schema::*;
pub use summary::*;
pub use utils::*;
pub use window::*;

/// Builds the ledger for an already-read table. Shorthand for [`Ledger::build`].
pub fn build_ledger(
    table: &RawTable,
    mapping: &ColumnMapping,
) -> Result<(Ledger, LedgerDiagnostics)> {
    Ledger::build(table, mapping)
}
