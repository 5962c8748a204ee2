use crate::detect::{decode_statement, sniff_delimiter};
use crate::error::{Result, StatementError};
use csv::{ReaderBuilder, Trim};
use log::{debug, info};

/// One row of the uploaded file: header name to raw cell text, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based line number in the decoded text, counting skipped lines.
    pub line: usize,
    cells: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new(line: usize, cells: Vec<(String, String)>) -> Self {
        Self { line, cells }
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    pub fn cells(&self) -> &[(String, String)] {
        &self.cells
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRecord>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first `n` rows, for showing the user a sample before mapping.
    pub fn sample(&self, n: usize) -> &[RawRecord] {
        &self.rows[..n.min(self.rows.len())]
    }
}

/// How to cut the decoded text into a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFormat {
    /// `None` sniffs the delimiter from the header line.
    pub delimiter: Option<u8>,
    pub skip_rows: usize,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            delimiter: Some(crate::detect::DEFAULT_DELIMITER),
            skip_rows: 0,
        }
    }
}

/// Decodes raw upload bytes and reads them into a [`RawTable`].
pub fn read_statement(
    bytes: &[u8],
    encoding: Option<&str>,
    format: &TableFormat,
) -> Result<RawTable> {
    let decoded = decode_statement(bytes, encoding)?;
    info!(
        "Decoded statement upload ({} bytes) as {}",
        bytes.len(),
        decoded.encoding.name()
    );
    read_table(&decoded.text, format)
}

/// Reads already-decoded statement text (for example pasted content).
pub fn read_pasted_table(text: &str, format: &TableFormat) -> Result<RawTable> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    read_table(text, format)
}

pub fn read_table(text: &str, format: &TableFormat) -> Result<RawTable> {
    let delimiter = format
        .delimiter
        .unwrap_or_else(|| sniff_delimiter(text, format.skip_rows));

    let body = skip_lines(text, format.skip_rows);
    if body.trim().is_empty() {
        return Err(StatementError::EmptyStatement {
            skip_rows: format.skip_rows,
        });
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(StatementError::EmptyStatement {
            skip_rows: format.skip_rows,
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line() as usize + format.skip_rows)
            .unwrap_or(0);

        let cells = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();

        rows.push(RawRecord::new(line, cells));
    }

    debug!(
        "Read {} columns and {} rows (delimiter {:?}, skipped {} line(s))",
        headers.len(),
        rows.len(),
        delimiter as char,
        format.skip_rows
    );

    Ok(RawTable { headers, rows })
}

fn skip_lines(text: &str, n: usize) -> &str {
    let mut rest = text;
    for _ in 0..n {
        match rest.find('\n') {
            Some(idx) => rest = &rest[idx + 1..],
            None => return "",
        }
    }
    rest
}
