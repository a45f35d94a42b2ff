use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::util::display::array_value_to_string;
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Roster, Row};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a roster from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one student per line
/// * `.json`    – `[{ "Name": "A", "Math": 30, ... }, ...]`
/// * `.parquet` – one scalar column per field
/// * `.xlsx`    – first worksheet, header in the first row (also `.xls`,
///   `.xlsm`, `.ods`)
pub fn load_file(path: &Path) -> Result<Roster> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let roster = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        "xlsx" | "xls" | "xlsm" | "ods" => load_excel(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading roster from {}", path.display()))?;

    log::info!(
        "Loaded {} row(s) x {} column(s) from {}",
        roster.len(),
        roster.columns().len(),
        path.display()
    );
    Ok(roster)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, then one row per student.
/// Each cell's type is guessed independently; empty cells and the usual NA
/// spellings (`NA`, `N/A`, `NaN`, `null`, ...) are missing.
fn load_csv(path: &Path) -> Result<Roster> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(col, value)| (col.clone(), CellValue::parse(value.trim())))
            .collect();
        rows.push(row);
    }

    Ok(Roster::new(headers, rows)?)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, as `df.to_json(orient='records')`
/// writes it):
///
/// ```json
/// [
///   { "Name": "A", "Math": 30, "Sci": 50 },
///   { "Name": "B", "Math": 90, "Sci": 85 }
/// ]
/// ```
///
/// Column order is the order keys are first seen.
fn load_json(path: &Path) -> Result<Roster> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = Row::new();
        for (key, val) in obj {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
            row.insert(key.clone(), json_to_cell(val));
        }
        rows.push(row);
    }

    Ok(Roster::new(columns, rows)?)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per roster field.
///
/// Integer columns of any width are cast to Int64 and floating or decimal
/// columns to Float64, so marks stay numeric however they were written.
/// Other types (dates, timestamps, ...) are rendered as display text.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Roster> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let mut batch_rows = vec![Row::new(); batch.num_rows()];
        for (col_idx, name) in columns.iter().enumerate() {
            let cells = extract_column(batch.column(col_idx))
                .with_context(|| format!("reading parquet column '{name}'"))?;
            for (row, cell) in batch_rows.iter_mut().zip(cells) {
                row.insert(name.clone(), cell);
            }
        }
        rows.extend(batch_rows);
    }

    Ok(Roster::new(columns, rows)?)
}

/// Convert a whole Arrow column into cells.
fn extract_column(col: &ArrayRef) -> Result<Vec<CellValue>> {
    let dt = col.data_type();
    match dt {
        DataType::Dictionary(_, value_type) => {
            let values = cast(col, value_type)?;
            extract_column(&values)
        }
        DataType::Boolean => {
            let arr = col.as_boolean();
            Ok(cells_of(col, |i| CellValue::Bool(arr.value(i))))
        }
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let utf8 = cast(col, &DataType::Utf8)?;
            let arr = utf8.as_string::<i32>();
            Ok(cells_of(col, |i| CellValue::String(arr.value(i).to_string())))
        }
        dt if dt.is_integer() => {
            let ints = cast(col, &DataType::Int64)?;
            let arr = ints.as_primitive::<Int64Type>();
            Ok(cells_of(&ints, |i| CellValue::Integer(arr.value(i))))
        }
        dt if dt.is_floating()
            || matches!(dt, DataType::Decimal128(..) | DataType::Decimal256(..)) =>
        {
            let floats = cast(col, &DataType::Float64)?;
            let arr = floats.as_primitive::<Float64Type>();
            Ok(cells_of(&floats, |i| CellValue::Float(arr.value(i))))
        }
        _ => (0..col.len())
            .map(|i| {
                if col.is_null(i) {
                    Ok(CellValue::Null)
                } else {
                    Ok(CellValue::String(array_value_to_string(col, i)?))
                }
            })
            .collect(),
    }
}

/// Map every slot of `col`, nulls becoming [`CellValue::Null`].
fn cells_of(col: &ArrayRef, value: impl Fn(usize) -> CellValue) -> Vec<CellValue> {
    (0..col.len())
        .map(|i| if col.is_null(i) { CellValue::Null } else { value(i) })
        .collect()
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

/// First worksheet of an `.xlsx`/`.xls`/`.xlsm`/`.ods` workbook. The first
/// row is the header, like `pd.read_excel` with its defaults.
fn load_excel(path: &Path) -> Result<Roster> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("Workbook has no worksheets")?
        .context("reading first worksheet")?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(header) => header.iter().map(|h| h.to_string().trim().to_string()).collect(),
        None => Vec::new(),
    };

    let rows = sheet_rows
        .map(|cells| {
            headers
                .iter()
                .zip(cells)
                .map(|(col, cell)| (col.clone(), excel_cell(cell)))
                .collect::<Row>()
        })
        .collect();

    Ok(Roster::new(headers, rows)?)
}

/// Excel stores every number as a float; whole values come back as integers
/// so integer-only totals survive the round trip through a spreadsheet.
fn excel_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
            CellValue::Integer(*f as i64)
        }
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => {
            let s = s.trim();
            if CellValue::is_na_token(s) {
                CellValue::Null
            } else {
                CellValue::String(s.to_string())
            }
        }
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Empty | Data::Error(_) => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}
