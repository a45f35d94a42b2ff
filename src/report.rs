//! Text and JSON rendering of an analysis.
//!
//! Tables go through Arrow: rows become a `RecordBatch` with one typed
//! column per roster column, printed with Arrow's pretty formatter.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, UInt64Array};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use serde_json::{json, Map, Value as JsonValue};

use crate::analysis::Analysis;
use crate::cli::Section;
use crate::data::filter::RowView;
use crate::data::model::{CellValue, Roster, Row, NULL_CELL};
use crate::data::summary::SubjectSpread;

// ---------------------------------------------------------------------------
// Arrow tables
// ---------------------------------------------------------------------------

/// Column storage chosen from the non-null cells of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnStorage {
    Int,
    Float,
    Bool,
    Text,
}

fn storage_for(cells: &[&CellValue]) -> ColumnStorage {
    let mut storage: Option<ColumnStorage> = None;
    for cell in cells.iter().filter(|c| !c.is_null()) {
        let this = match cell {
            CellValue::Integer(_) => ColumnStorage::Int,
            CellValue::Float(_) => ColumnStorage::Float,
            CellValue::Bool(_) => ColumnStorage::Bool,
            _ => ColumnStorage::Text,
        };
        storage = Some(match (storage, this) {
            (None, s) => s,
            (Some(a), b) if a == b => a,
            (Some(ColumnStorage::Int), ColumnStorage::Float)
            | (Some(ColumnStorage::Float), ColumnStorage::Int) => ColumnStorage::Float,
            _ => return ColumnStorage::Text,
        });
    }
    storage.unwrap_or(ColumnStorage::Text)
}

fn column_array(cells: &[&CellValue]) -> ArrayRef {
    match storage_for(cells) {
        ColumnStorage::Int => Arc::new(Int64Array::from(
            cells
                .iter()
                .map(|c| match c {
                    CellValue::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        ColumnStorage::Float => Arc::new(Float64Array::from(
            cells.iter().map(|c| c.as_f64()).collect::<Vec<_>>(),
        )),
        ColumnStorage::Bool => Arc::new(BooleanArray::from(
            cells
                .iter()
                .map(|c| match c {
                    CellValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        ColumnStorage::Text => Arc::new(StringArray::from(
            cells
                .iter()
                .map(|c| (!c.is_null()).then(|| c.to_string()))
                .collect::<Vec<_>>(),
        )),
    }
}

fn format_columns(columns: Vec<(String, ArrayRef)>) -> Result<String> {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(name, array.data_type().clone(), true))
        .collect();
    let arrays: Vec<ArrayRef> = columns.into_iter().map(|(_, a)| a).collect();
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
        .context("building table")?;
    Ok(pretty_format_batches(&[batch])
        .context("formatting table")?
        .to_string())
}

/// Format `rows` as a text table with the given column order.
pub fn render_table<'a, I>(columns: &[String], rows: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Row>,
{
    let rows: Vec<&Row> = rows.into_iter().collect();
    let arrays = columns
        .iter()
        .map(|col| {
            let cells: Vec<&CellValue> = rows
                .iter()
                .map(|r| r.get(col).unwrap_or(&NULL_CELL))
                .collect();
            (col.clone(), column_array(&cells))
        })
        .collect();
    format_columns(arrays)
}

fn render_view(view: &RowView<'_>) -> Result<String> {
    render_table(view.source().columns(), view.rows())
}

fn named(name: &str, array: ArrayRef) -> (String, ArrayRef) {
    (name.to_string(), array)
}

fn floats(values: impl Iterator<Item = f64>) -> ArrayRef {
    Arc::new(Float64Array::from_iter_values(values))
}

fn counts(values: impl Iterator<Item = usize>) -> ArrayRef {
    Arc::new(UInt64Array::from_iter_values(values.map(|v| v as u64)))
}

/// `Name (identifier), Math (subject), ..., Total (derived)`.
fn column_roles(analysis: &Analysis) -> String {
    analysis
        .enriched
        .columns()
        .iter()
        .map(|col| {
            let role = analysis.schema.kind_of(col).map_or("derived", |k| k.as_str());
            format!("{col} ({role})")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Comma-separated identifiers to pick a student from.
fn student_list(analysis: &Analysis) -> String {
    let ids: Vec<String> = analysis.student_ids().iter().map(|id| id.to_string()).collect();
    format!("Students: {}", ids.join(", "))
}

fn render_charts(analysis: &Analysis) -> Result<String> {
    let mut out = String::new();
    let id = analysis.enriched.identifier();

    let bins = &analysis.total_histogram;
    writeln!(out, "Total marks distribution")?;
    out.push_str(&format_columns(vec![
        named("From", floats(bins.iter().map(|b| b.lower))),
        named("To", floats(bins.iter().map(|b| b.upper))),
        named("Students", counts(bins.iter().map(|b| b.count))),
    ])?);

    let series = &analysis.average_series;
    let ids: Vec<&CellValue> = series.iter().map(|(id, _)| id).collect();
    let averages: Vec<Option<f64>> = series.iter().map(|(_, avg)| *avg).collect();
    writeln!(out, "\n\nAverage marks per student")?;
    out.push_str(&format_columns(vec![
        named(id, column_array(&ids)),
        named("Average", Arc::new(Float64Array::from(averages))),
    ])?);

    let points = &analysis.scatter;
    let ids: Vec<&CellValue> = points.iter().map(|p| &p.id).collect();
    writeln!(out, "\n\nTotal vs Average")?;
    out.push_str(&format_columns(vec![
        named(id, column_array(&ids)),
        named("Total", floats(points.iter().map(|p| p.total))),
        named("Average", floats(points.iter().map(|p| p.average))),
    ])?);

    let spread = &analysis.subject_spread;
    let stat = |f: fn(&SubjectSpread) -> Option<f64>| -> ArrayRef {
        Arc::new(Float64Array::from(spread.iter().map(f).collect::<Vec<_>>()))
    };
    writeln!(out, "\n\nSubject-wise marks spread")?;
    out.push_str(&format_columns(vec![
        named(
            "Subject",
            Arc::new(StringArray::from_iter_values(spread.iter().map(|s| s.subject.as_str()))),
        ),
        named("Count", counts(spread.iter().map(|s| s.count))),
        named("Min", stat(|s| s.min)),
        named("Q1", stat(|s| s.q1)),
        named("Median", stat(|s| s.median)),
        named("Q3", stat(|s| s.q3)),
        named("Max", stat(|s| s.max)),
    ])?);

    Ok(out)
}

/// Render the requested sections of the text report.
pub fn render_text(roster: &Roster, analysis: &Analysis, sections: &[Section]) -> Result<String> {
    let mut out = String::new();

    for section in sections {
        let (title, body) = match section {
            Section::Uploaded => (
                "Uploaded data".to_string(),
                render_table(roster.columns(), roster.rows())?,
            ),
            Section::Processed => (
                "Processed data (Total & Average)".to_string(),
                format!(
                    "Columns: {}\n{}",
                    column_roles(analysis),
                    render_table(analysis.enriched.columns(), analysis.enriched.rows())?
                ),
            ),
            Section::Student => match (&analysis.student, analysis.student_view()) {
                (Some((id, _)), Some(view)) if !view.is_empty() => {
                    (format!("Details for {id}"), render_view(&view)?)
                }
                (Some((id, _)), _) => (
                    format!("Details for {id}"),
                    format!("No matching student.\n{}", student_list(analysis)),
                ),
                _ => ("Students".to_string(), student_list(analysis)),
            },
            Section::LowAverage => {
                let view = analysis.low_average_view();
                (
                    format!("Students with low average (Average < 40): {}", view.len()),
                    render_view(&view)?,
                )
            }
            Section::Lagging => {
                let view = analysis.lagging_view();
                (
                    format!("Lagging students (any subject mark < 35): {}", view.len()),
                    render_view(&view)?,
                )
            }
            Section::Charts => ("Chart data".to_string(), render_charts(analysis)?),
        };
        writeln!(out, "== {title} ==")?;
        writeln!(out, "{body}\n")?;
    }

    Ok(out)
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// A row as a JSON object with keys in column order.
fn row_to_json(columns: &[String], row: &Row) -> JsonValue {
    let mut obj = Map::new();
    for col in columns {
        let cell = row.get(col).unwrap_or(&NULL_CELL);
        obj.insert(col.clone(), serde_json::to_value(cell).unwrap_or(JsonValue::Null));
    }
    JsonValue::Object(obj)
}

fn view_to_json(view: &RowView<'_>) -> JsonValue {
    let columns = view.source().columns();
    JsonValue::Array(view.rows().map(|r| row_to_json(columns, r)).collect())
}

/// Serialize the whole analysis as a pretty JSON document.
pub fn render_json(analysis: &Analysis) -> Result<String> {
    let enriched = &analysis.enriched;
    let student = match (&analysis.student, analysis.student_view()) {
        (Some((id, _)), Some(view)) => json!({ "id": id, "rows": view_to_json(&view) }),
        _ => JsonValue::Null,
    };

    let rows: Vec<JsonValue> = enriched
        .rows()
        .iter()
        .map(|r| row_to_json(enriched.columns(), r))
        .collect();

    let doc = json!({
        "identifier": enriched.identifier(),
        "subject_columns": enriched.subject_columns(),
        "schema": analysis.schema,
        "students": analysis.student_ids(),
        "columns": enriched.columns(),
        "rows": rows,
        "low_average": view_to_json(&analysis.low_average_view()),
        "lagging": view_to_json(&analysis.lagging_view()),
        "student": student,
        "charts": {
            "total_histogram": analysis.total_histogram,
            "average_series": analysis.average_series,
            "total_vs_average": analysis.scatter,
            "subject_marks": analysis.subject_marks,
            "subject_spread": analysis.subject_spread,
        },
    });

    serde_json::to_string_pretty(&doc).context("serializing report")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, AnalysisOptions};

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn roster() -> Roster {
        let names: Vec<String> = ["Name", "Math", "Sci"].iter().map(|c| c.to_string()).collect();
        let data = [("A", 30, 50), ("B", 90, 85)];
        let rows = data
            .iter()
            .map(|(n, m, sc)| {
                let mut row = Row::new();
                row.insert("Name".into(), s(n));
                row.insert("Math".into(), CellValue::Integer(*m));
                row.insert("Sci".into(), CellValue::Integer(*sc));
                row
            })
            .collect();
        Roster::new(names, rows).unwrap()
    }

    #[test]
    fn test_storage_inference() {
        let (i, f, b, t) = (
            CellValue::Integer(1),
            CellValue::Float(1.5),
            CellValue::Bool(true),
            s("x"),
        );
        assert_eq!(storage_for(&[&i, &NULL_CELL]), ColumnStorage::Int);
        assert_eq!(storage_for(&[&i, &f]), ColumnStorage::Float);
        assert_eq!(storage_for(&[&b]), ColumnStorage::Bool);
        assert_eq!(storage_for(&[&i, &t]), ColumnStorage::Text);
        assert_eq!(storage_for(&[&NULL_CELL]), ColumnStorage::Text);
    }

    #[test]
    fn test_render_table_lists_rows() {
        let r = roster();
        let text = render_table(r.columns(), r.rows()).unwrap();
        assert!(text.contains("Name"));
        assert!(text.contains("Math"));
        assert!(text.contains("| A "));
        assert!(text.contains("85"));
    }

    #[test]
    fn test_render_text_sections() {
        let r = roster();
        let options = AnalysisOptions {
            student: Some(s("B")),
            ..AnalysisOptions::default()
        };
        let analysis = analyze(&r, &options).unwrap();
        let sections = [Section::Processed, Section::Student, Section::Lagging];
        let text = render_text(&r, &analysis, &sections).unwrap();

        assert!(text.contains("== Processed data (Total & Average) =="));
        assert!(text.contains("Columns: Name (identifier), Math (subject), Sci (subject), "));
        assert!(text.contains("Total (derived), Average (derived)"));
        assert!(text.contains("Average"));
        assert!(text.contains("87.5"));
        assert!(text.contains("== Details for B =="));
        assert!(text.contains("== Lagging students (any subject mark < 35): 1 =="));
        assert!(!text.contains("Uploaded data"));
    }

    #[test]
    fn test_student_section_lists_choices() {
        let r = roster();
        let analysis = analyze(&r, &AnalysisOptions::default()).unwrap();
        let text = render_text(&r, &analysis, &[Section::Student]).unwrap();
        assert!(text.contains("== Students =="));
        assert!(text.contains("Students: A, B"));

        let options = AnalysisOptions {
            student: Some(s("Z")),
            ..AnalysisOptions::default()
        };
        let analysis = analyze(&r, &options).unwrap();
        let text = render_text(&r, &analysis, &[Section::Student]).unwrap();
        assert!(text.contains("== Details for Z =="));
        assert!(text.contains("No matching student."));
        assert!(text.contains("Students: A, B"));
    }

    #[test]
    fn test_render_charts_section() {
        let r = roster();
        let analysis = analyze(&r, &AnalysisOptions::default()).unwrap();
        let text = render_text(&r, &analysis, &[Section::Charts]).unwrap();
        assert!(text.contains("Total marks distribution"));
        assert!(text.contains("Subject-wise marks spread"));
        assert!(text.contains("Median"));
    }

    #[test]
    fn test_render_json_shape() {
        let r = roster();
        let analysis = analyze(&r, &AnalysisOptions::default()).unwrap();
        let doc: JsonValue = serde_json::from_str(&render_json(&analysis).unwrap()).unwrap();

        assert_eq!(doc["identifier"], "Name");
        assert_eq!(doc["subject_columns"], json!(["Math", "Sci"]));
        assert_eq!(doc["rows"][0]["Total"], 80);
        assert_eq!(doc["rows"][1]["Average"], 87.5);
        assert_eq!(doc["low_average"], json!([]));
        assert_eq!(doc["lagging"][0]["Name"], "A");
        assert!(doc["student"].is_null());
        assert_eq!(doc["students"], json!(["A", "B"]));
        assert_eq!(doc["schema"]["identifier"], "Name");
        assert_eq!(doc["schema"]["columns"][1], json!({"name": "Math", "kind": "subject"}));

        let keys: Vec<&String> = doc["rows"][0].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["Name", "Math", "Sci", "Total", "Average"]);
    }
}
