//! Plain-data series for charting the enriched roster.
//!
//! Nothing here draws; the outputs are handed to whatever renders charts.

use serde::Serialize;

use super::aggregate::EnrichedRoster;
use super::error::RosterError;
use super::model::CellValue;

/// Bin count used for the Total distribution unless configured otherwise.
pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub id: CellValue,
    pub total: f64,
    pub average: f64,
}

/// One (student, subject, mark) triple of the long-format table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectMark {
    pub id: CellValue,
    pub subject: String,
    pub mark: f64,
}

/// Five-number summary of one subject's marks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSpread {
    pub subject: String,
    pub count: usize,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

/// Equal-width histogram over `[min, max]`; the last bin is closed on the
/// right. Non-finite values are ignored.
pub fn histogram(values: &[f64], bins: usize) -> Result<Vec<HistogramBin>, RosterError> {
    if bins == 0 {
        return Err(RosterError::InvalidBinCount);
    }
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let Some(min) = finite.iter().copied().reduce(f64::min) else {
        return Ok(Vec::new());
    };
    let max = finite.iter().copied().fold(min, f64::max);

    if max == min {
        return Ok(vec![HistogramBin {
            lower: min,
            upper: max,
            count: finite.len(),
        }]);
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for v in finite {
        let slot = (((v - min) / width).floor() as usize).min(bins - 1);
        out[slot].count += 1;
    }
    Ok(out)
}

/// Histogram of the `Total` column.
pub fn total_histogram(
    roster: &EnrichedRoster,
    bins: usize,
) -> Result<Vec<HistogramBin>, RosterError> {
    let totals: Vec<f64> = (0..roster.len()).map(|i| roster.total(i)).collect();
    histogram(&totals, bins)
}

/// Identifier and Average of every row, for a per-student bar chart.
pub fn average_series(roster: &EnrichedRoster) -> Vec<(CellValue, Option<f64>)> {
    (0..roster.len())
        .map(|i| (roster.identifier_of(i).clone(), roster.average(i)))
        .collect()
}

/// Total against Average for every row that has an Average.
pub fn total_vs_average(roster: &EnrichedRoster) -> Vec<ScatterPoint> {
    (0..roster.len())
        .filter_map(|i| {
            roster.average(i).map(|average| ScatterPoint {
                id: roster.identifier_of(i).clone(),
                total: roster.total(i),
                average,
            })
        })
        .collect()
}

/// Long-format marks over the subject columns only; missing marks dropped.
pub fn melt_subjects(roster: &EnrichedRoster) -> Vec<SubjectMark> {
    let mut out = Vec::new();
    for i in 0..roster.len() {
        for subject in roster.subject_columns() {
            if let Some(mark) = roster.cell(i, subject).as_f64() {
                out.push(SubjectMark {
                    id: roster.identifier_of(i).clone(),
                    subject: subject.clone(),
                    mark,
                });
            }
        }
    }
    out
}

/// Linear-interpolated quantile of already sorted values.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Per-subject spread for a box plot, in subject column order.
pub fn subject_spread(roster: &EnrichedRoster) -> Vec<SubjectSpread> {
    roster
        .subject_columns()
        .iter()
        .map(|subject| {
            let mut marks: Vec<f64> = roster
                .table()
                .column_cells(subject)
                .filter_map(CellValue::as_f64)
                .collect();
            marks.sort_by(f64::total_cmp);
            SubjectSpread {
                subject: subject.clone(),
                count: marks.len(),
                min: marks.first().copied(),
                q1: quantile(&marks, 0.25),
                median: quantile(&marks, 0.5),
                q3: quantile(&marks, 0.75),
                max: marks.last().copied(),
            }
        })
        .collect()
}
