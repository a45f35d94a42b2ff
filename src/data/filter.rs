use super::aggregate::EnrichedRoster;
use super::model::{CellValue, Row};

// ---------------------------------------------------------------------------
// RowView – an ordered subset of an enriched roster
// ---------------------------------------------------------------------------

/// Rows of an [`EnrichedRoster`] picked by index, in roster order.
#[derive(Debug, Clone)]
pub struct RowView<'a> {
    source: &'a EnrichedRoster,
    indices: Vec<usize>,
}

impl<'a> RowView<'a> {
    pub fn new(source: &'a EnrichedRoster, indices: Vec<usize>) -> Self {
        RowView { source, indices }
    }

    pub fn source(&self) -> &'a EnrichedRoster {
        self.source
    }

    /// Positions of the selected rows in the source roster.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a Row> + '_ {
        let rows = self.source.rows();
        self.indices.iter().map(move |&i| &rows[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Index filters
// ---------------------------------------------------------------------------

/// Return indices of rows for which `keep(index, row)` holds, in order.
pub fn filtered_indices<F>(roster: &EnrichedRoster, mut keep: F) -> Vec<usize>
where
    F: FnMut(usize, &Row) -> bool,
{
    roster
        .rows()
        .iter()
        .enumerate()
        .filter(|(i, row)| keep(*i, row))
        .map(|(i, _)| i)
        .collect()
}

/// Identifier of every row, in roster order; the list a user picks from.
/// Identifiers are not required to be unique.
pub fn student_ids(roster: &EnrichedRoster) -> Vec<CellValue> {
    (0..roster.len())
        .map(|i| roster.identifier_of(i).clone())
        .collect()
}

/// All rows whose identifier equals `id`. Numeric ids compare by value, so
/// `7` selects a row stored as `7.0`.
pub fn select_student<'a>(roster: &'a EnrichedRoster, id: &CellValue) -> RowView<'a> {
    let indices = filtered_indices(roster, |i, _| roster.identifier_of(i).matches(id));
    if indices.is_empty() {
        log::warn!("No student with identifier '{id}'");
    }
    RowView::new(roster, indices)
}
