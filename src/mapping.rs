use crate::error::ConfigurationError;
use crate::ingestion::RawRecord;
use crate::normalize::NumberFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_DATE_FORMAT: &str = "%d-%m-%Y";
pub const DEFAULT_DECIMAL_SEPARATOR: char = ',';
pub const DEFAULT_THOUSANDS_SEPARATOR: char = '.';

/// Semantic role a raw column can be bound to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Date,
    Debit,
    Credit,
    Balance,
    Category,
    Description,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Date => "date",
            Role::Debit => "debit",
            Role::Credit => "credit",
            Role::Balance => "balance",
            Role::Category => "category",
            Role::Description => "description",
        };
        f.write_str(name)
    }
}

/// User-declared binding of raw headers to semantic roles, plus the locale
/// settings needed to read this particular export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnMapping {
    #[schemars(description = "Header of the transaction date column")]
    pub date_field: String,

    #[schemars(description = "Header of the money-out column")]
    pub debit_field: String,

    #[schemars(description = "Header of the money-in column")]
    pub credit_field: String,

    #[serde(default)]
    #[schemars(description = "Header of the running balance column, if the export has one")]
    pub balance_field: Option<String>,

    #[schemars(description = "Header of the category column")]
    pub category_field: String,

    #[serde(default)]
    #[schemars(description = "Header of the free-text description column, if wanted")]
    pub description_field: Option<String>,

    #[serde(default = "default_date_format")]
    #[schemars(description = "strftime-style date pattern, e.g. %d-%m-%Y")]
    pub date_format: String,

    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: char,

    #[serde(default = "default_thousands_separator")]
    pub thousands_separator: char,
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_decimal_separator() -> char {
    DEFAULT_DECIMAL_SEPARATOR
}

fn default_thousands_separator() -> char {
    DEFAULT_THOUSANDS_SEPARATOR
}

impl ColumnMapping {
    pub fn new(
        date_field: impl Into<String>,
        debit_field: impl Into<String>,
        credit_field: impl Into<String>,
        category_field: impl Into<String>,
    ) -> Self {
        Self {
            date_field: date_field.into(),
            debit_field: debit_field.into(),
            credit_field: credit_field.into(),
            balance_field: None,
            category_field: category_field.into(),
            description_field: None,
            date_format: default_date_format(),
            decimal_separator: DEFAULT_DECIMAL_SEPARATOR,
            thousands_separator: DEFAULT_THOUSANDS_SEPARATOR,
        }
    }

    pub fn with_balance(mut self, field: impl Into<String>) -> Self {
        self.balance_field = Some(field.into());
        self
    }

    pub fn with_description(mut self, field: impl Into<String>) -> Self {
        self.description_field = Some(field.into());
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    pub fn with_separators(mut self, decimal: char, thousands: char) -> Self {
        self.decimal_separator = decimal;
        self.thousands_separator = thousands;
        self
    }

    pub fn number_format(&self) -> NumberFormat {
        NumberFormat::new(self.decimal_separator, self.thousands_separator)
    }

    /// Every bound (role, column) pair, optional roles included when set.
    pub fn bindings(&self) -> Vec<(Role, &str)> {
        let mut bindings = vec![
            (Role::Date, self.date_field.as_str()),
            (Role::Debit, self.debit_field.as_str()),
            (Role::Credit, self.credit_field.as_str()),
            (Role::Category, self.category_field.as_str()),
        ];
        if let Some(balance) = &self.balance_field {
            bindings.push((Role::Balance, balance.as_str()));
        }
        if let Some(description) = &self.description_field {
            bindings.push((Role::Description, description.as_str()));
        }
        bindings
    }

    /// Checks the mapping against the statement headers. Role collisions are
    /// reported before missing columns so the user sees the binding mistake.
    pub fn validate(&self, headers: &[String]) -> Result<(), ConfigurationError> {
        let mut by_column: BTreeMap<&str, Vec<Role>> = BTreeMap::new();
        for (role, column) in self.bindings() {
            by_column.entry(column).or_default().push(role);
        }
        if let Some((column, roles)) = by_column.into_iter().find(|(_, roles)| roles.len() > 1) {
            return Err(ConfigurationError::DuplicateColumn {
                column: column.to_string(),
                roles,
            });
        }

        for (role, column) in self.bindings() {
            if !headers.iter().any(|h| h == column) {
                return Err(ConfigurationError::MissingColumn {
                    role,
                    column: column.to_string(),
                });
            }
        }

        if self.decimal_separator == self.thousands_separator {
            return Err(ConfigurationError::SeparatorCollision(
                self.decimal_separator,
            ));
        }

        if self.date_format.trim().is_empty() {
            return Err(ConfigurationError::EmptyDateFormat);
        }

        Ok(())
    }
}

/// Header names in file order, taken across the sample rows so a header that
/// only some rows carry is still offered.
pub fn list_columns(sample_rows: &[RawRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in sample_rows {
        for header in row.headers() {
            if !columns.iter().any(|c| c == header) {
                columns.push(header.to_string());
            }
        }
    }
    columns
}
