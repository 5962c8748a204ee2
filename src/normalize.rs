//! Locale-aware amount parsing and strict date parsing.
//!
//! A cell that cannot be read is reported as a [`ParseFailure`]; callers map
//! it to "missing", never to zero or to a default date.

use crate::error::ParseFailure;
use chrono::{NaiveDate, NaiveDateTime};

/// Decimal and thousands separators of one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pub decimal_separator: char,
    pub thousands_separator: char,
}

impl NumberFormat {
    pub fn new(decimal_separator: char, thousands_separator: char) -> Self {
        Self {
            decimal_separator,
            thousands_separator,
        }
    }

    /// `1.234,56`
    pub fn european() -> Self {
        Self::new(',', '.')
    }

    /// `1,234.56`
    pub fn english() -> Self {
        Self::new('.', ',')
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::european()
    }
}

/// Parses a locale-formatted amount. Every character that is not a digit or
/// one of the two separators is dropped (currency symbols, spaces, signs),
/// thousands separators are removed and the decimal separator becomes `.`.
pub fn parse_amount(raw: &str, format: NumberFormat) -> Result<f64, ParseFailure> {
    let kept: String = raw
        .chars()
        .filter(|c| {
            c.is_ascii_digit() || *c == format.thousands_separator || *c == format.decimal_separator
        })
        .filter(|c| *c != format.thousands_separator)
        .map(|c| if c == format.decimal_separator { '.' } else { c })
        .collect();

    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return Err(ParseFailure::new(raw, "no digits"));
    }

    kept.parse::<f64>()
        .map_err(|e| ParseFailure::new(raw, e.to_string()))
}

/// Renders a value with two decimals and grouped thousands, the inverse of
/// [`parse_amount`] for non-negative values.
pub fn format_amount(value: f64, format: NumberFormat) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(format.thousands_separator);
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}{}{}", sign, grouped, format.decimal_separator, frac_part)
}

/// Strict parse against `pattern`; no alternative patterns are tried.
/// Patterns carrying a time component are accepted and the time is dropped.
pub fn parse_date(raw: &str, pattern: &str) -> Result<NaiveDate, ParseFailure> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseFailure::new(raw, "empty date"));
    }

    match NaiveDate::parse_from_str(trimmed, pattern) {
        Ok(date) => Ok(date),
        Err(date_err) => NaiveDateTime::parse_from_str(trimmed, pattern)
            .map(|dt| dt.date())
            .map_err(|_| {
                ParseFailure::new(raw, format!("does not match '{}': {}", pattern, date_err))
            }),
    }
}
