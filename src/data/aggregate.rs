use serde::Serialize;

use super::error::RosterError;
use super::filter::{filtered_indices, RowView};
use super::model::{CellValue, Roster, Row, AVERAGE_COLUMN, RESERVED_COLUMNS, TOTAL_COLUMN};
use super::schema::RosterSchema;

/// Rows with an Average strictly below this are low performers.
pub const LOW_AVERAGE_THRESHOLD: f64 = 40.0;

/// A subject mark strictly below this means the student is lagging.
pub const LAGGING_THRESHOLD: f64 = 35.0;

// ---------------------------------------------------------------------------
// EnrichedRoster – roster + Total + Average
// ---------------------------------------------------------------------------

/// The input roster with `Total` and `Average` appended after every
/// original column.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRoster {
    table: Roster,
    identifier: String,
    subject_columns: Vec<String>,
}

/// Per-row aggregate over the subject columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RowStats {
    pub total: f64,
    /// `None` when the row has no marks at all.
    pub average: Option<f64>,
}

impl EnrichedRoster {
    /// Ordered column names, `Total` and `Average` last.
    pub fn columns(&self) -> &[String] {
        self.table.columns()
    }

    pub fn rows(&self) -> &[Row] {
        self.table.rows()
    }

    pub fn table(&self) -> &Roster {
        &self.table
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Subject columns the aggregates were computed over.
    pub fn subject_columns(&self) -> &[String] {
        &self.subject_columns
    }

    pub fn cell(&self, row: usize, column: &str) -> &CellValue {
        self.table.cell(row, column)
    }

    pub fn identifier_of(&self, row: usize) -> &CellValue {
        self.table.cell(row, &self.identifier)
    }

    pub fn total(&self, row: usize) -> f64 {
        self.cell(row, TOTAL_COLUMN).as_f64().unwrap_or(0.0)
    }

    pub fn average(&self, row: usize) -> Option<f64> {
        self.cell(row, AVERAGE_COLUMN).as_f64()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Sum and mean of the present marks of one row. Missing cells are skipped.
pub fn row_stats<S: AsRef<str>>(row: &Row, subjects: &[S]) -> RowStats {
    let marks: Vec<f64> = subjects
        .iter()
        .filter_map(|s| row.get(s.as_ref()).and_then(CellValue::as_f64))
        .collect();
    let total: f64 = marks.iter().sum();
    let average = if marks.is_empty() {
        None
    } else {
        Some(total / marks.len() as f64)
    };
    RowStats { total, average }
}

/// Integer rows keep an integer Total so whole-number rosters print cleanly.
fn total_cell<S: AsRef<str>>(row: &Row, subjects: &[S], total: f64) -> CellValue {
    let mut sum: i64 = 0;
    for subject in subjects {
        match row.get(subject.as_ref()) {
            Some(CellValue::Integer(i)) => match sum.checked_add(*i) {
                Some(next) => sum = next,
                None => return CellValue::Float(total),
            },
            Some(CellValue::Float(_)) => return CellValue::Float(total),
            _ => {}
        }
    }
    CellValue::Integer(sum)
}

/// Append `Total` and `Average` to every row of `roster`.
///
/// Both are computed over exactly the schema's subject columns. Missing
/// marks are left out of the sum and of the mean's denominator; a row with
/// no marks gets `Total = 0` and a `Null` Average. The input is not touched.
pub fn enrich(roster: &Roster, schema: &RosterSchema) -> EnrichedRoster {
    let subjects = schema.subject_columns();

    let rows: Vec<Row> = roster
        .rows()
        .iter()
        .map(|row| {
            let stats = row_stats(row, &subjects);
            let mut enriched = row.clone();
            enriched.insert(TOTAL_COLUMN.to_string(), total_cell(row, &subjects, stats.total));
            enriched.insert(
                AVERAGE_COLUMN.to_string(),
                stats.average.map_or(CellValue::Null, CellValue::Float),
            );
            enriched
        })
        .collect();

    let table = roster.with_derived(&RESERVED_COLUMNS, rows);

    log::debug!(
        "Enriched {} row(s) over {} subject column(s)",
        table.len(),
        subjects.len()
    );

    EnrichedRoster {
        table,
        identifier: schema.identifier().to_string(),
        subject_columns: subjects,
    }
}

/// Rows whose Average is strictly below [`LOW_AVERAGE_THRESHOLD`].
/// Rows without an Average are never included.
pub fn classify_low_average(enriched: &EnrichedRoster) -> RowView<'_> {
    let indices = filtered_indices(enriched, |i, _| {
        enriched
            .average(i)
            .is_some_and(|avg| avg < LOW_AVERAGE_THRESHOLD)
    });
    RowView::new(enriched, indices)
}

/// Rows with at least one mark strictly below [`LAGGING_THRESHOLD`] among
/// `subject_columns`. Missing marks never count.
///
/// `subject_columns` must not name a derived column.
pub fn classify_lagging<'a, S: AsRef<str>>(
    enriched: &'a EnrichedRoster,
    subject_columns: &[S],
) -> Result<RowView<'a>, RosterError> {
    for column in subject_columns {
        let column = column.as_ref();
        if RESERVED_COLUMNS.contains(&column) {
            return Err(RosterError::DerivedSubjectColumn(column.to_string()));
        }
        if !enriched.table().has_column(column) {
            return Err(RosterError::UnknownColumn(column.to_string()));
        }
    }

    let indices = filtered_indices(enriched, |_, row| {
        subject_columns.iter().any(|c| {
            row.get(c.as_ref())
                .and_then(CellValue::as_f64)
                .is_some_and(|mark| mark < LAGGING_THRESHOLD)
        })
    });
    Ok(RowView::new(enriched, indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn roster(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Roster {
        let names: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|cells| names.iter().cloned().zip(cells).collect::<Row>())
            .collect();
        Roster::new(names, rows).unwrap()
    }

    fn enrich_all(r: &Roster) -> EnrichedRoster {
        let schema = schema::infer(r, None).unwrap();
        enrich(r, &schema)
    }

    fn sample() -> Roster {
        roster(
            &["Name", "Math", "Sci"],
            vec![
                vec![s("A"), CellValue::Integer(30), CellValue::Integer(50)],
                vec![s("B"), CellValue::Integer(90), CellValue::Integer(85)],
            ],
        )
    }

    #[test]
    fn test_worked_example() {
        let enriched = enrich_all(&sample());

        assert_eq!(enriched.columns(), ["Name", "Math", "Sci", "Total", "Average"]);
        assert_eq!(enriched.total(0), 80.0);
        assert_eq!(enriched.average(0), Some(40.0));
        assert_eq!(enriched.total(1), 175.0);
        assert_eq!(enriched.average(1), Some(87.5));
        assert_eq!(enriched.cell(0, TOTAL_COLUMN), &CellValue::Integer(80));

        assert!(classify_low_average(&enriched).is_empty());

        let lagging = classify_lagging(&enriched, enriched.subject_columns()).unwrap();
        assert_eq!(lagging.indices(), [0]);
        assert_eq!(enriched.identifier_of(0), &s("A"));
    }

    #[test]
    fn test_enrich_is_idempotent_and_leaves_input_alone() {
        let input = sample();
        let before = input.clone();
        let first = enrich_all(&input);
        let second = enrich_all(&input);
        assert_eq!(first, second);
        assert_eq!(input, before);
        assert!(!input.has_column(TOTAL_COLUMN));
    }

    #[test]
    fn test_totals_match_subject_sums() {
        let r = roster(
            &["Name", "Eng", "Math", "House", "Sci"],
            vec![
                vec![
                    s("A"),
                    CellValue::Integer(10),
                    CellValue::Float(20.5),
                    s("Red"),
                    CellValue::Integer(30),
                ],
                vec![
                    s("B"),
                    CellValue::Integer(70),
                    CellValue::Float(80.0),
                    s("Blue"),
                    CellValue::Integer(90),
                ],
            ],
        );
        let enriched = enrich_all(&r);
        for i in 0..enriched.len() {
            let sum: f64 = enriched
                .subject_columns()
                .iter()
                .filter_map(|c| enriched.cell(i, c).as_f64())
                .sum();
            assert_eq!(enriched.total(i), sum);
            assert_eq!(enriched.average(i), Some(sum / 3.0));
        }
        assert_eq!(enriched.cell(0, TOTAL_COLUMN), &CellValue::Float(60.5));
    }

    #[test]
    fn test_missing_marks_are_skipped() {
        let r = roster(
            &["Name", "Math", "Sci"],
            vec![
                vec![s("A"), CellValue::Integer(60), CellValue::Null],
                vec![s("B"), CellValue::Null, CellValue::Null],
                vec![s("C"), CellValue::Integer(20), CellValue::Integer(40)],
            ],
        );
        let enriched = enrich_all(&r);

        assert_eq!(enriched.total(0), 60.0);
        assert_eq!(enriched.average(0), Some(60.0));

        assert_eq!(enriched.total(1), 0.0);
        assert_eq!(enriched.average(1), None);
        assert!(enriched.cell(1, AVERAGE_COLUMN).is_null());

        // B has no Average and no marks, so it is in neither view.
        assert_eq!(classify_low_average(&enriched).indices(), [2]);
        let lagging = classify_lagging(&enriched, enriched.subject_columns()).unwrap();
        assert_eq!(lagging.indices(), [2]);
    }

    #[test]
    fn test_non_finite_marks_are_skipped() {
        let r = roster(
            &["Name", "Math", "Sci"],
            vec![
                vec![s("A"), CellValue::Float(f64::NAN), CellValue::Float(85.0)],
                vec![s("B"), CellValue::Float(30.0), CellValue::Float(f64::INFINITY)],
            ],
        );
        let enriched = enrich_all(&r);

        assert_eq!(enriched.total(0), 85.0);
        assert_eq!(enriched.average(0), Some(85.0));
        assert_eq!(enriched.total(1), 30.0);
        assert_eq!(enriched.average(1), Some(30.0));

        let lagging = classify_lagging(&enriched, enriched.subject_columns()).unwrap();
        assert_eq!(lagging.indices(), [1]);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let r = roster(
            &["Name", "Math", "Sci"],
            vec![
                vec![s("Edge"), CellValue::Integer(35), CellValue::Integer(45)],
                vec![s("Below"), CellValue::Float(34.99), CellValue::Float(45.0)],
                vec![s("Low"), CellValue::Float(39.0), CellValue::Float(40.98)],
            ],
        );
        let enriched = enrich_all(&r);

        // Edge: average exactly 40, lowest mark exactly 35.
        assert_eq!(enriched.average(0), Some(40.0));
        let low = classify_low_average(&enriched);
        assert_eq!(low.indices(), [1, 2]);

        let lagging = classify_lagging(&enriched, enriched.subject_columns()).unwrap();
        assert_eq!(lagging.indices(), [1]);
    }

    #[test]
    fn test_views_partition_and_keep_order() {
        let marks = [[80, 90], [20, 10], [50, 30], [36, 38], [10, 95], [34, 34]];
        let rows = marks
            .iter()
            .enumerate()
            .map(|(i, m)| {
                vec![
                    CellValue::Integer(i as i64),
                    CellValue::Integer(m[0]),
                    CellValue::Integer(m[1]),
                ]
            })
            .collect();
        let enriched = enrich_all(&roster(&["Roll", "Math", "Sci"], rows));

        let low = classify_low_average(&enriched);
        let lagging = classify_lagging(&enriched, enriched.subject_columns()).unwrap();

        for i in 0..enriched.len() {
            let avg = enriched.average(i).unwrap();
            assert_eq!(low.indices().contains(&i), avg < LOW_AVERAGE_THRESHOLD);

            let any_low = enriched
                .subject_columns()
                .iter()
                .any(|c| enriched.cell(i, c).as_f64().unwrap() < LAGGING_THRESHOLD);
            assert_eq!(lagging.indices().contains(&i), any_low);
        }
        assert!(low.indices().windows(2).all(|w| w[0] < w[1]));
        assert!(lagging.indices().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(lagging.indices(), [1, 2, 4, 5]);
    }

    #[test]
    fn test_subject_set_never_holds_derived_columns() {
        let enriched = enrich_all(&sample());
        assert!(enriched
            .subject_columns()
            .iter()
            .all(|c| !RESERVED_COLUMNS.contains(&c.as_str())));

        // Re-inferring on the enriched table picks the derived columns up
        // as numeric; feeding that straight to the classifier is refused.
        let reinferred = schema::infer(enriched.table(), None).unwrap();
        let err = classify_lagging(&enriched, &reinferred.subject_columns()).unwrap_err();
        assert_eq!(err, RosterError::DerivedSubjectColumn(TOTAL_COLUMN.into()));

        let err = classify_lagging(&enriched, &["Art"]).unwrap_err();
        assert_eq!(err, RosterError::UnknownColumn("Art".into()));
    }

    #[test]
    fn test_metadata_columns_survive_enrichment() {
        let r = roster(
            &["Name", "House", "Math"],
            vec![vec![s("A"), s("Red"), CellValue::Integer(12)]],
        );
        let enriched = enrich_all(&r);
        assert_eq!(enriched.cell(0, "House"), &s("Red"));
        assert_eq!(enriched.identifier(), "Name");
        assert_eq!(enriched.identifier_of(0), &s("A"));
    }
}
