use chrono::NaiveDate;
use thiserror::Error;

use crate::mapping::Role;

#[derive(Error, Debug)]
pub enum StatementError {
    #[error("Could not decode statement as {encoding}: {details}")]
    Decoding { encoding: String, details: String },

    #[error("Invalid column mapping: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Invalid date range: end {end} is before start {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Narrative service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Statement has no header row after skipping {skip_rows} line(s)")]
    EmptyStatement { skip_rows: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("{role} column '{column}' does not exist in the statement headers")]
    MissingColumn { role: Role, column: String },

    #[error("column '{column}' is bound to more than one role: {}", format_roles(.roles))]
    DuplicateColumn { column: String, roles: Vec<Role> },

    #[error("decimal and thousands separators must differ (both are '{0}')")]
    SeparatorCollision(char),

    #[error("date format must not be empty")]
    EmptyDateFormat,

    #[error("window length must be at least one day, got {0}")]
    InvalidWindow(u32),
}

fn format_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A single cell that could not be read. Collected into ledger diagnostics,
/// never returned past the ledger builder.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("could not parse '{raw}': {reason}")]
pub struct ParseFailure {
    pub raw: String,
    pub reason: String,
}

impl ParseFailure {
    pub fn new(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("no API credential was provided")]
    MissingCredential,

    #[error("the API credential was rejected (status {0})")]
    Unauthorized(u16),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("rate limit reached, retry later")]
    RateLimited,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, StatementError>;
