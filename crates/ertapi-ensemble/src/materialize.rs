//! Conversion of delimited-text payloads into numeric tables.
//!
//! Payloads are comma-separated numbers, one logical row per line. Every
//! token must parse as `f64`; there is no best-effort mode. A payload that
//! is empty (ignoring one trailing line terminator) is a table with no rows.

use std::borrow::Cow;

use crate::error::{NodeError, Result};

/// Anonymous numeric matrix. Rows are not required to share a length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    rows: Vec<Vec<f64>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_rectangular(&self) -> bool {
        match self.rows.first() {
            Some(first) => self.rows.iter().all(|r| r.len() == first.len()),
            None => true,
        }
    }

    /// Column `index` across all rows, or `None` if any row is too short.
    pub fn column(&self, index: usize) -> Option<Vec<f64>> {
        self.rows.iter().map(|r| r.get(index).copied()).collect()
    }

    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.rows
    }
}

impl From<Vec<Vec<f64>>> for Table {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        Self::new(rows)
    }
}

/// Parse a single comma-separated row.
pub fn to_single_row(bytes: &[u8]) -> Result<Table> {
    let text = decode(bytes);
    let body = strip_terminator(&text);
    if body.is_empty() {
        return Ok(Table::default());
    }
    Ok(Table::new(vec![parse_row(body, 0)?]))
}

/// Parse newline-separated rows of comma-separated values.
pub fn to_matrix(bytes: &[u8]) -> Result<Table> {
    let text = decode(bytes);
    let body = strip_terminator(&text);
    if body.is_empty() {
        return Ok(Table::default());
    }
    let rows = body
        .split('\n')
        .enumerate()
        .map(|(i, line)| parse_row(line.strip_suffix('\r').unwrap_or(line), i))
        .collect::<Result<Vec<_>>>()?;
    Ok(Table::new(rows))
}

// Invalid UTF-8 decodes to U+FFFD and then fails numeric parsing at its row/column.
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

fn strip_terminator(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

fn parse_row(line: &str, row: usize) -> Result<Vec<f64>> {
    line.split(',')
        .enumerate()
        .map(|(column, token)| {
            let token = token.trim();
            token.parse::<f64>().map_err(|_| NodeError::DataConversion {
                token: token.to_string(),
                row,
                column,
            })
        })
        .collect()
}
