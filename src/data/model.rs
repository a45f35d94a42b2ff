use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use super::error::RosterError;

/// Name of the derived per-row sum column.
pub const TOTAL_COLUMN: &str = "Total";
/// Name of the derived per-row mean column.
pub const AVERAGE_COLUMN: &str = "Average";
/// Column names an input roster may not carry.
pub const RESERVED_COLUMNS: [&str; 2] = [TOTAL_COLUMN, AVERAGE_COLUMN];

/// Text tokens read as a missing value, matching what pandas' CSV reader
/// treats as NA by default.
pub const NA_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Shared empty cell returned for columns a row does not carry.
pub static NULL_CELL: CellValue = CellValue::Null;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the roster
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common spreadsheet dtypes.
/// Only `Integer` and `Float` count as marks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the value as a mark. Non-numeric and non-finite cells
    /// yield `None`, so NaN never reaches a sum.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_finite() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Float(_))
    }

    /// Whether `s` is one of the [`NA_TOKENS`].
    pub fn is_na_token(s: &str) -> bool {
        NA_TOKENS.contains(&s)
    }

    /// Guess the type of a raw text cell (CSV fields, command-line values).
    pub fn parse(s: &str) -> CellValue {
        if Self::is_na_token(s) {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }

    /// Equality that treats `Integer(3)` and `Float(3.0)` as the same value.
    pub fn matches(&self, other: &CellValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

// ---------------------------------------------------------------------------
// Roster – the loaded table
// ---------------------------------------------------------------------------

/// One student row: column_name → value. Absent columns read as `Null`.
pub type Row = BTreeMap<String, CellValue>;

/// An ordered table of student rows with an ordered column list.
/// The first column is the student identifier unless told otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    column_names: Vec<String>,
    rows: Vec<Row>,
}

impl Roster {
    /// Build a roster, rejecting empty, duplicate and reserved column names.
    pub fn new(column_names: Vec<String>, rows: Vec<Row>) -> Result<Self, RosterError> {
        if column_names.is_empty() {
            return Err(RosterError::NoColumns);
        }
        let mut seen = BTreeSet::new();
        for (pos, name) in column_names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(RosterError::EmptyHeader(pos));
            }
            if RESERVED_COLUMNS.contains(&name.as_str()) {
                return Err(RosterError::ReservedColumn(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(RosterError::DuplicateColumn(name.clone()));
            }
        }
        for row in &rows {
            if let Some(extra) = row.keys().find(|k| !seen.contains(k.as_str())) {
                return Err(RosterError::UnknownColumn(extra.clone()));
            }
        }
        Ok(Roster { column_names, rows })
    }

    /// A copy of this roster's columns plus `derived`, over replacement
    /// rows. Only the aggregator builds these, after validation.
    pub(crate) fn with_derived(&self, derived: &[&str], rows: Vec<Row>) -> Roster {
        let mut column_names = self.column_names.clone();
        column_names.extend(derived.iter().map(|c| c.to_string()));
        Roster { column_names, rows }
    }

    /// Ordered column names.
    pub fn columns(&self) -> &[String] {
        &self.column_names
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Cell at (`row`, `column`); `Null` when the row lacks the column.
    pub fn cell(&self, row: usize, column: &str) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL_CELL)
    }

    /// Iterate over one column's cells in row order.
    pub fn column_cells<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a CellValue> + 'a {
        self.rows
            .iter()
            .map(move |r| r.get(column).unwrap_or(&NULL_CELL))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the roster has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
