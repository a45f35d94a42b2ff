//! Column classification for a loaded roster.
//!
//! Inference runs as its own step so that a roster without marks is
//! rejected before any aggregation happens.

use serde::Serialize;

use super::error::RosterError;
use super::model::Roster;

/// Role of a column in the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Names or ids the rows are reported by.
    Identifier,
    /// Uniformly numeric column holding marks.
    Subject,
    /// Everything else; carried through untouched.
    Metadata,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Identifier => "identifier",
            ColumnKind::Subject => "subject",
            ColumnKind::Metadata => "metadata",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
}

/// Typed classification of every column of a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterSchema {
    identifier: String,
    columns: Vec<ColumnInfo>,
}

impl RosterSchema {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The numeric subject columns, in roster order.
    pub fn subject_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Subject)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Role of `column`; `None` for columns added after inference.
    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|c| c.name == column).map(|c| c.kind)
    }
}

/// Whether every non-null cell of `column` is a number, with at least one
/// number present.
pub fn is_numeric_column(roster: &Roster, column: &str) -> bool {
    let mut seen_number = false;
    for cell in roster.column_cells(column) {
        if cell.is_null() {
            continue;
        }
        if !cell.is_numeric() {
            return false;
        }
        seen_number = true;
    }
    seen_number
}

/// Classify the columns of `roster`.
///
/// `identifier` defaults to the first column. The identifier is never a
/// subject, even when it is numeric.
pub fn infer(roster: &Roster, identifier: Option<&str>) -> Result<RosterSchema, RosterError> {
    let identifier = match identifier {
        Some(name) if roster.has_column(name) => name.to_string(),
        Some(name) => return Err(RosterError::UnknownColumn(name.to_string())),
        None => roster
            .columns()
            .first()
            .cloned()
            .ok_or(RosterError::NoColumns)?,
    };

    let columns: Vec<ColumnInfo> = roster
        .columns()
        .iter()
        .map(|name| {
            let kind = if *name == identifier {
                ColumnKind::Identifier
            } else if is_numeric_column(roster, name) {
                ColumnKind::Subject
            } else {
                ColumnKind::Metadata
            };
            ColumnInfo {
                name: name.clone(),
                kind,
            }
        })
        .collect();

    if !columns.iter().any(|c| c.kind == ColumnKind::Subject) {
        return Err(RosterError::NoNumericColumns);
    }

    log::debug!(
        "Schema: identifier '{identifier}', {} subject column(s)",
        columns.iter().filter(|c| c.kind == ColumnKind::Subject).count()
    );

    Ok(RosterSchema {
        identifier,
        columns,
    })
}
