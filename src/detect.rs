//! Byte-encoding and field-delimiter detection for raw statement uploads.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::error::{Result, StatementError};

/// Delimiter assumed when none is configured and sniffing finds nothing better.
pub const DEFAULT_DELIMITER: u8 = b';';

const DELIMITER_CANDIDATES: [u8; 4] = [b';', b',', b'\t', b'|'];
const SNIFF_LINES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    ByteOrderMark,
    ValidUtf8,
    Statistical,
    Declared,
}

/// Best guess at how the upload is encoded.
#[derive(Debug, Clone, Copy)]
pub struct EncodingGuess {
    pub encoding: &'static Encoding,
    pub method: DetectionMethod,
}

impl EncodingGuess {
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// `true` when the encoding came from byte statistics alone; callers
    /// should offer the user an explicit encoding override.
    pub fn is_guess(&self) -> bool {
        self.method == DetectionMethod::Statistical
    }
}

#[derive(Debug, Clone)]
pub struct DecodedStatement {
    pub text: String,
    pub encoding: &'static Encoding,
    pub method: DetectionMethod,
}

impl DecodedStatement {
    pub fn is_guess(&self) -> bool {
        self.method == DetectionMethod::Statistical
    }
}

pub fn detect_encoding(bytes: &[u8]) -> EncodingGuess {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return EncodingGuess {
            encoding,
            method: DetectionMethod::ByteOrderMark,
        };
    }

    if std::str::from_utf8(bytes).is_ok() {
        return EncodingGuess {
            encoding: UTF_8,
            method: DetectionMethod::ValidUtf8,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    EncodingGuess {
        encoding: detector.guess(None, true),
        method: DetectionMethod::Statistical,
    }
}

/// Resolves a user-declared encoding label (`"latin1"`, `"windows-1252"`, ...).
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| StatementError::Decoding {
        encoding: label.to_string(),
        details: "unknown encoding label".to_string(),
    })
}

/// Decodes the upload, using `declared` when given and detection otherwise.
/// Malformed byte sequences are an error rather than replacement characters.
pub fn decode_statement(bytes: &[u8], declared: Option<&str>) -> Result<DecodedStatement> {
    let guess = match declared {
        Some(label) => EncodingGuess {
            encoding: encoding_for_label(label)?,
            method: DetectionMethod::Declared,
        },
        None => detect_encoding(bytes),
    };

    debug!(
        "Decoding {} bytes as {} ({:?})",
        bytes.len(),
        guess.name(),
        guess.method
    );

    let (text, actual, had_errors) = guess.encoding.decode(bytes);
    if had_errors {
        let hint = if guess.method == DetectionMethod::Declared {
            "the declared encoding does not match the file"
        } else {
            "detection was inconclusive; retry with an explicit encoding"
        };
        return Err(StatementError::Decoding {
            encoding: actual.name().to_string(),
            details: hint.to_string(),
        });
    }

    Ok(DecodedStatement {
        text: text.into_owned(),
        encoding: actual,
        method: guess.method,
    })
}

/// Picks the delimiter that splits the first lines most consistently,
/// falling back to [`DEFAULT_DELIMITER`]. Rows may carry fewer fields than
/// the header, never more.
pub fn sniff_delimiter(text: &str, skip_rows: usize) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .skip(skip_rows)
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    if lines.is_empty() {
        return DEFAULT_DELIMITER;
    }

    let mut best: Option<(u8, usize)> = None;
    for candidate in DELIMITER_CANDIDATES {
        let header_count = count_unquoted(lines[0], candidate);
        if header_count == 0 {
            continue;
        }
        // Short trailing rows are allowed; most rows must match the header.
        let rows = &lines[1..];
        let counts: Vec<usize> = rows.iter().map(|l| count_unquoted(l, candidate)).collect();
        if counts.iter().any(|&c| c > header_count) {
            continue;
        }
        let matching = counts.iter().filter(|&&c| c == header_count).count();
        if matching * 2 < counts.len() {
            continue;
        }
        match best {
            Some((_, count)) if count >= header_count => {}
            _ => best = Some((candidate, header_count)),
        }
    }

    let delimiter = best.map(|(d, _)| d).unwrap_or(DEFAULT_DELIMITER);
    debug!("Sniffed delimiter {:?}", delimiter as char);
    delimiter
}

fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}
