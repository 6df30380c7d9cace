//! Batch mode: one analysis per species and a summary of significant rows

use std::collections::BTreeSet;

use serde::Serialize;

use crate::algorithm::executor::{AnalysisExecutor, AnalysisKind, AnalysisRequest, AnalysisResult};
use crate::algorithm::outcome::{ChiSquaredOutcome, RepeatTallies};
use crate::analysis::remarks::{Comparison, Conclusion, significant_or_false};
use crate::io::dataset::Selection;
use crate::io::error::{AnalysisError, Result, invalid_parameter};
use crate::io::report::AnalysisReport;
use crate::spatial::area::AreaDefinition;

/// Code of a significant chi-squared test without a direction
pub const SIGNIFICANT_CODE: &str = "s";
/// Code of a result that isn't significant
pub const NOT_SIGNIFICANT_CODE: &str = "ns";

/// Build one request per species, or per species pair for inter-specific
/// attraction
///
/// Species pairs skip a species paired with itself, and each unordered pair
/// runs once in the order it first appears.
///
/// # Errors
///
/// Returns an error if no species is given, or second species are missing
/// for inter-specific attraction
pub fn batch_requests(
    kind: AnalysisKind,
    locations: &[u32],
    species: &[u32],
    second_species: &[u32],
    areas: &AreaDefinition,
) -> Result<Vec<AnalysisRequest>> {
    if species.is_empty() {
        return Err(invalid_parameter("species", &"[]", &"select at least one species"));
    }
    let selection = |id: u32| Selection::new(locations.to_vec(), vec![id]);

    let requests = match kind {
        AnalysisKind::SpotPreference => species
            .iter()
            .map(|&id| AnalysisRequest::SpotPreference {
                selection: selection(id),
                areas: areas.clone(),
            })
            .collect(),
        AnalysisKind::AttractionIntra => species
            .iter()
            .map(|&id| AnalysisRequest::AttractionIntra {
                selection: selection(id),
            })
            .collect(),
        AnalysisKind::AttractionInter => {
            if second_species.is_empty() {
                return Err(invalid_parameter(
                    "second species",
                    &"[]",
                    &"inter-specific batches need a second species selection",
                ));
            }
            let mut seen = BTreeSet::new();
            species
                .iter()
                .flat_map(|&a| second_species.iter().map(move |&b| (a, b)))
                .filter(|&(a, b)| a != b && seen.insert((a.min(b), a.max(b))))
                .map(|(a, b)| AnalysisRequest::AttractionInter {
                    first: selection(a),
                    second: selection(b),
                })
                .collect()
        }
    };
    Ok(requests)
}

/// A batch job that had nothing to analyse
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedJob {
    /// Species of the job
    pub label: String,
    /// Why it was skipped
    pub reason: String,
}

/// Reports of all finished jobs of a batch
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    /// Reports in job order
    pub reports: Vec<AnalysisReport>,
    /// Jobs without data
    pub skipped: Vec<SkippedJob>,
}

/// Progress notifications of a running batch
pub trait BatchObserver {
    /// A job starts
    fn job_started(&mut self, index: usize, label: &str, repeats: usize);
    /// A repeat of the running job finished
    fn repeat_finished(&mut self, index: usize, repeat: usize);
    /// A job finished or was skipped
    fn job_finished(&mut self, index: usize);
}

/// Observer that ignores all notifications
pub struct NoProgress;

impl BatchObserver for NoProgress {
    fn job_started(&mut self, _index: usize, _label: &str, _repeats: usize) {}
    fn repeat_finished(&mut self, _index: usize, _repeat: usize) {}
    fn job_finished(&mut self, _index: usize) {}
}

/// Run all jobs in order
///
/// A job whose selection has no usable plates is skipped with a warning,
/// every other error ends the batch.
///
/// # Errors
///
/// Returns the first error that isn't an empty selection
pub fn run_batch(
    executor: &mut AnalysisExecutor<'_>,
    requests: &[AnalysisRequest],
    observer: &mut dyn BatchObserver,
) -> Result<BatchOutcome> {
    let mut outcome = BatchOutcome::default();
    let repeats = executor.settings().repeats.max(1);

    for (index, request) in requests.iter().enumerate() {
        let label = request.label(executor.dataset());
        observer.job_started(index, &label, repeats);
        let result = executor.run(request, &mut |repeat| observer.repeat_finished(index, repeat));
        observer.job_finished(index);

        match result {
            Ok(report) => outcome.reports.push(report),
            Err(AnalysisError::EmptySelection { reason }) => {
                tracing::warn!(species = %label, %reason, "Skipping batch job");
                outcome.skipped.push(SkippedJob { label, reason });
            }
            Err(err) => return Err(err),
        }
    }

    tracing::info!(
        jobs = requests.len(),
        finished = outcome.reports.len(),
        skipped = outcome.skipped.len(),
        "Batch completed"
    );
    Ok(outcome)
}

/// One column of a summary row
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryCell {
    /// Column name such as `wilcoxon 2-24` or `chi_squared A+B`
    pub column: String,
    /// Whether the result is significant
    pub significant: bool,
    /// Coded result such as `at; p=0.0500` or `ns`
    pub text: String,
}

/// Summary of one analysis in a batch
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryRow {
    /// Species of the analysis
    pub label: String,
    /// Plates used
    pub n_plates: usize,
    /// Result columns
    pub cells: Vec<SummaryCell>,
}

/// Rows of a batch with at least one significant result
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Alpha level used to select the rows
    pub alpha_level: f64,
    /// Rows in job order
    pub rows: Vec<SummaryRow>,
    /// Jobs that were run
    pub jobs: usize,
    /// Jobs skipped for lack of data
    pub skipped: Vec<SkippedJob>,
}

/// Summarise a batch, keeping rows with any significant result
pub fn summarize(outcome: &BatchOutcome, alpha: f64) -> BatchSummary {
    let rows = outcome
        .reports
        .iter()
        .map(|report| summary_row(report, alpha))
        .filter(|row| row.cells.iter().any(|cell| cell.significant))
        .collect();
    BatchSummary {
        alpha_level: alpha,
        rows,
        jobs: outcome.reports.len() + outcome.skipped.len(),
        skipped: outcome.skipped.clone(),
    }
}

fn summary_row(report: &AnalysisReport, alpha: f64) -> SummaryRow {
    let mut cells = repeat_cells(repeat_tallies(&report.result), alpha);
    match &report.result {
        AnalysisResult::SpotPreference(result) => {
            let cell = result.chi_squared.as_ref().map_or_else(
                || SummaryCell {
                    column: "chi_squared areas".to_string(),
                    significant: false,
                    text: NOT_SIGNIFICANT_CODE.to_string(),
                },
                |chi| {
                    chi_cell(
                        "chi_squared areas".to_string(),
                        SIGNIFICANT_CODE,
                        chi.test.statistic,
                        chi.test.p_value,
                        alpha,
                    )
                },
            );
            cells.push(cell);
        }
        AnalysisResult::AttractionIntra(result) => {
            cells.extend(distance_chi_cells(&result.chi_squared, alpha));
        }
        AnalysisResult::AttractionInter(result) => {
            cells.extend(distance_chi_cells(&result.chi_squared, alpha));
        }
    }
    SummaryRow {
        label: report.label.clone(),
        n_plates: report.result.n_plates(),
        cells,
    }
}

const fn repeat_tallies(result: &AnalysisResult) -> &RepeatTallies {
    match result {
        AnalysisResult::SpotPreference(result) => &result.repeats,
        AnalysisResult::AttractionIntra(result) => &result.repeats,
        AnalysisResult::AttractionInter(result) => &result.repeats,
    }
}

fn repeat_cells(tallies: &RepeatTallies, alpha: f64) -> Vec<SummaryCell> {
    tallies
        .groups
        .iter()
        .map(|tally| {
            let column = format!("wilcoxon {}", tally.group);
            let p_value = tally.summary_p_value(tallies.repeats);
            match tally.major() {
                Some((conclusion, _)) if significant_or_false(p_value, alpha) => SummaryCell {
                    column,
                    significant: true,
                    text: format!("{}; p={p_value:.4}", conclusion.code()),
                },
                _ => SummaryCell {
                    column,
                    significant: false,
                    text: NOT_SIGNIFICANT_CODE.to_string(),
                },
            }
        })
        .collect()
}

fn distance_chi_cells(outcomes: &[ChiSquaredOutcome], alpha: f64) -> Vec<SummaryCell> {
    outcomes
        .iter()
        .map(|outcome| {
            let conclusion = Conclusion::from_means(
                Comparison::SpotDistance,
                outcome.summary.mean_observed,
                outcome.summary.mean_expected,
            );
            chi_cell(
                format!("chi_squared {}", outcome.summary.group),
                conclusion.code(),
                outcome.test.statistic,
                outcome.test.p_value,
                alpha,
            )
        })
        .collect()
}

fn chi_cell(column: String, code: &str, statistic: f64, p_value: f64, alpha: f64) -> SummaryCell {
    if significant_or_false(p_value, alpha) {
        SummaryCell {
            column,
            significant: true,
            text: format!("{code}; chi-sq={statistic:.4}; p={p_value:.4}"),
        }
    } else {
        SummaryCell {
            column,
            significant: false,
            text: NOT_SIGNIFICANT_CODE.to_string(),
        }
    }
}
