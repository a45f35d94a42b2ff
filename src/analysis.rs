use crate::data::aggregate::{classify_lagging, classify_low_average, enrich, EnrichedRoster};
use crate::data::error::RosterError;
use crate::data::filter::{select_student, student_ids, RowView};
use crate::data::model::{CellValue, Roster};
use crate::data::schema::{self, RosterSchema};
use crate::data::summary::{
    self, HistogramBin, ScatterPoint, SubjectMark, SubjectSpread, DEFAULT_HISTOGRAM_BINS,
};

// ---------------------------------------------------------------------------
// Analysis inputs
// ---------------------------------------------------------------------------

/// Everything a single analysis pass depends on besides the roster itself.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    /// Identifier column; `None` means the first column.
    pub identifier: Option<String>,
    /// Student to pull out of the enriched roster.
    pub student: Option<CellValue>,
    /// Bin count for the Total distribution.
    pub histogram_bins: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            identifier: None,
            student: None,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

// ---------------------------------------------------------------------------
// Analysis results
// ---------------------------------------------------------------------------

/// The full result of analysing one roster, independent of rendering.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub schema: RosterSchema,
    pub enriched: EnrichedRoster,

    /// Rows with Average < 40.
    pub low_average: Vec<usize>,

    /// Rows with any subject mark < 35.
    pub lagging: Vec<usize>,

    /// Selected student and the rows carrying that identifier.
    pub student: Option<(CellValue, Vec<usize>)>,

    pub total_histogram: Vec<HistogramBin>,
    pub average_series: Vec<(CellValue, Option<f64>)>,
    pub scatter: Vec<ScatterPoint>,
    pub subject_marks: Vec<SubjectMark>,
    pub subject_spread: Vec<SubjectSpread>,
}

impl Analysis {
    pub fn low_average_view(&self) -> RowView<'_> {
        RowView::new(&self.enriched, self.low_average.clone())
    }

    pub fn lagging_view(&self) -> RowView<'_> {
        RowView::new(&self.enriched, self.lagging.clone())
    }

    pub fn student_view(&self) -> Option<RowView<'_>> {
        self.student
            .as_ref()
            .map(|(_, rows)| RowView::new(&self.enriched, rows.clone()))
    }

    /// Identifiers a caller can choose a student from.
    pub fn student_ids(&self) -> Vec<CellValue> {
        student_ids(&self.enriched)
    }
}

/// Run schema inference, enrichment, classification and the chart
/// summaries over `roster`. Nothing is cached between calls.
pub fn analyze(roster: &Roster, options: &AnalysisOptions) -> Result<Analysis, RosterError> {
    let schema = schema::infer(roster, options.identifier.as_deref())?;
    let enriched = enrich(roster, &schema);

    let low_average = classify_low_average(&enriched).indices().to_vec();
    let lagging = classify_lagging(&enriched, enriched.subject_columns())?
        .indices()
        .to_vec();

    let student = options.student.as_ref().map(|id| {
        let rows = select_student(&enriched, id).indices().to_vec();
        (id.clone(), rows)
    });

    let total_histogram = summary::total_histogram(&enriched, options.histogram_bins)?;

    log::info!(
        "Analysed {} student(s): {} low average, {} lagging",
        enriched.len(),
        low_average.len(),
        lagging.len()
    );

    Ok(Analysis {
        average_series: summary::average_series(&enriched),
        scatter: summary::total_vs_average(&enriched),
        subject_marks: summary::melt_subjects(&enriched),
        subject_spread: summary::subject_spread(&enriched),
        schema,
        enriched,
        low_average,
        lagging,
        student,
        total_histogram,
    })
}
