//! Analysis reports: terminal text and JSON files

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::algorithm::batch::{BatchOutcome, BatchSummary};
use crate::algorithm::executor::{AnalysisKind, AnalysisResult, AnalysisSettings};
use crate::algorithm::outcome::{
    ChiSquaredOutcome, LocationOutcome, RepeatTallies, WilcoxonOutcome,
};
use crate::io::configuration::{BATCH_SUMMARY_FILE, REPORT_EXTENSION};
use crate::io::dataset::{Dataset, Selection};
use crate::io::error::{Result, WithPath};

/// Names of the localities and species of a selection
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectionReport {
    /// Selected locality ids, empty for all
    pub location_ids: Vec<u32>,
    /// Locality names
    pub locations: Vec<String>,
    /// Selected species ids
    pub species_ids: Vec<u32>,
    /// Species names
    pub species: Vec<String>,
}

impl SelectionReport {
    /// Look up the names of a selection
    pub fn describe(selection: &Selection, dataset: &Dataset) -> Self {
        Self {
            location_ids: selection.locations.clone(),
            locations: selection
                .locations
                .iter()
                .map(|&id| dataset.locality_name(id))
                .collect(),
            species_ids: selection.species.clone(),
            species: selection
                .species
                .iter()
                .map(|&id| dataset.species_name(id))
                .collect(),
        }
    }
}

/// Everything known about one finished analysis
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Which analysis ran
    pub analysis: AnalysisKind,
    /// Report title
    pub title: String,
    /// Species of the selections
    pub label: String,
    /// Statistical parameters
    pub settings: AnalysisSettings,
    /// Selections in analysis order
    pub selections: Vec<SelectionReport>,
    /// Test results
    pub result: AnalysisResult,
}

impl AnalysisReport {
    /// File name for saving, unique within a batch through `index`
    pub fn file_name(&self, index: Option<usize>) -> String {
        let label = sanitize(&self.label);
        match index {
            Some(index) => format!(
                "{:03}_{}_{label}.{REPORT_EXTENSION}",
                index + 1,
                self.analysis.slug()
            ),
            None => format!("{}_{label}.{REPORT_EXTENSION}", self.analysis.slug()),
        }
    }

    /// Save the report as pretty printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn save_json(&self, path: &Path) -> Result<()> {
        write_json(self, path)?;
        tracing::info!(path = %path.display(), "Report saved");
        Ok(())
    }

    /// Render the report as plain text
    pub fn render(&self) -> String {
        let mut lines = vec![self.title.clone(), "=".repeat(self.title.len())];
        for (index, selection) in self.selections.iter().enumerate() {
            let locations = if selection.locations.is_empty() {
                "all".to_string()
            } else {
                selection.locations.join(", ")
            };
            lines.push(format!(
                "Selection {}: {} (localities: {locations})",
                index + 1,
                selection.species.join(", ")
            ));
        }
        lines.push(format!(
            "Alpha level: {}; normality alpha: {}; repeats: {}; seed: {}",
            self.settings.alpha_level,
            self.settings.normality_alpha,
            self.settings.repeats,
            self.settings.seed
        ));
        lines.push(format!("Plates: {}", self.result.n_plates()));

        match &self.result {
            AnalysisResult::SpotPreference(result) => {
                section(&mut lines, "Positive spots per area");
                for total in &result.area_totals {
                    let expected = total
                        .expected
                        .map_or_else(|| "-".to_string(), |value| format!("{value:.2}"));
                    lines.push(format!(
                        "  {} ({}): observed {}, expected {expected}",
                        total.name, total.definition, total.observed
                    ));
                }
                render_wilcoxon(&mut lines, &result.wilcoxon);
                section(&mut lines, "Chi-squared test on user areas");
                match &result.chi_squared {
                    Some(chi) => lines.push(format!(
                        "  chi-sq {:.4}, df {}, p {:.4}: {}",
                        chi.test.statistic, chi.test.df, chi.test.p_value, chi.remarks
                    )),
                    None => lines.push("  not performed".to_string()),
                }
                render_repeats(&mut lines, &result.repeats);
            }
            AnalysisResult::AttractionIntra(result) => {
                section(&mut lines, "Normality of observed distances (Shapiro-Wilk)");
                for outcome in &result.normality {
                    let text = outcome.test.map_or_else(
                        || "not tested".to_string(),
                        |test| format!("W {:.4}, p {:.4}", test.statistic, test.p_value),
                    );
                    let verdict = if outcome.normal { "normal" } else { "not normal" };
                    lines.push(format!("  {}: {text} ({verdict})", outcome.group));
                }
                section(&mut lines, "Significance of spot distances");
                for outcome in &result.location {
                    let summary = outcome.summary();
                    let method = match outcome {
                        LocationOutcome::TTest(_) => "t-test",
                        LocationOutcome::Wilcoxon(_) => "Wilcoxon",
                    };
                    let interval = outcome.conf_int().map_or_else(String::new, |(lower, upper)| {
                        format!(", CI [{lower:.4}, {upper:.4}]")
                    });
                    lines.push(format!(
                        "  {} (n={}, plates={}): {method} p {:.4}, mean {:.4} vs {:.4}{interval}; {}",
                        summary.group,
                        summary.n_values,
                        summary.n_plates,
                        outcome.p_value(),
                        summary.mean_observed,
                        summary.mean_expected,
                        location_remarks(outcome)
                    ));
                }
                render_chi_squared(&mut lines, &result.chi_squared);
                render_repeats(&mut lines, &result.repeats);
            }
            AnalysisResult::AttractionInter(result) => {
                render_wilcoxon(&mut lines, &result.wilcoxon);
                render_chi_squared(&mut lines, &result.chi_squared);
                render_repeats(&mut lines, &result.repeats);
            }
        }
        lines.join("\n")
    }
}

fn location_remarks(outcome: &LocationOutcome) -> &str {
    match outcome {
        LocationOutcome::TTest(outcome) => &outcome.remarks,
        LocationOutcome::Wilcoxon(outcome) => &outcome.remarks,
    }
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(title.to_string());
}

fn render_wilcoxon(lines: &mut Vec<String>, outcomes: &[WilcoxonOutcome]) {
    section(lines, "Wilcoxon rank-sum tests");
    for outcome in outcomes {
        lines.push(format!(
            "  {} (n={}, plates={}): W {:.1}, p {:.4}, mean {:.4} vs {:.4}; {}",
            outcome.summary.group,
            outcome.summary.n_values,
            outcome.summary.n_plates,
            outcome.test.statistic,
            outcome.test.p_value,
            outcome.summary.mean_observed,
            outcome.summary.mean_expected,
            outcome.remarks
        ));
    }
}

fn render_chi_squared(lines: &mut Vec<String>, outcomes: &[ChiSquaredOutcome]) {
    section(lines, "Chi-squared tests on distance frequencies");
    if outcomes.is_empty() {
        lines.push("  not performed".to_string());
    }
    for outcome in outcomes {
        lines.push(format!(
            "  {} (n={}): chi-sq {:.4}, df {}, p {:.4}; {}",
            outcome.summary.group,
            outcome.summary.n_values,
            outcome.test.statistic,
            outcome.test.df,
            outcome.test.p_value,
            outcome.remarks
        ));
    }
}

fn render_repeats(lines: &mut Vec<String>, tallies: &RepeatTallies) {
    section(
        lines,
        &format!("Significant results in {} repeats", tallies.repeats),
    );
    for tally in &tallies.groups {
        let conclusions = tally
            .conclusions
            .iter()
            .map(|(conclusion, count)| format!("{conclusion} {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "  {} (n={}): {} significant{}",
            tally.group,
            tally.n_values,
            tally.n_significant,
            if conclusions.is_empty() {
                String::new()
            } else {
                format!(" ({conclusions})")
            }
        ));
    }
}

/// Render a batch summary as plain text
pub fn render_summary(title: &str, summary: &BatchSummary) -> String {
    let mut lines = vec![
        format!("{title}: batch summary"),
        format!(
            "{} jobs, {} skipped, {} with significant results (alpha {})",
            summary.jobs,
            summary.skipped.len(),
            summary.rows.len(),
            summary.alpha_level
        ),
    ];
    for row in &summary.rows {
        lines.push(String::new());
        lines.push(format!("{} (plates={})", row.label, row.n_plates));
        for cell in &row.cells {
            lines.push(format!("  {}: {}", cell.column, cell.text));
        }
    }
    for skipped in &summary.skipped {
        lines.push(format!("Skipped {}: {}", skipped.label, skipped.reason));
    }
    lines.join("\n")
}

/// Save every report of a batch and the summary into a directory
///
/// Returns the written paths, summary last.
///
/// # Errors
///
/// Returns an error if the directory can't be created or a file can't be
/// written
pub fn save_all(outcome: &BatchOutcome, summary: &BatchSummary, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_path(dir, "create report directory")?;

    let mut paths = Vec::with_capacity(outcome.reports.len() + 1);
    for (index, report) in outcome.reports.iter().enumerate() {
        let path = dir.join(report.file_name(Some(index)));
        write_json(report, &path)?;
        paths.push(path);
    }
    let summary_path = dir.join(BATCH_SUMMARY_FILE);
    write_json(summary, &summary_path)?;
    paths.push(summary_path);

    tracing::info!(
        reports = outcome.reports.len(),
        dir = %dir.display(),
        "Batch reports saved"
    );
    Ok(paths)
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_path(parent, "create directory")?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_path(path, "write report")
}

fn sanitize(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let parts: Vec<&str> = cleaned.split('_').filter(|part| !part.is_empty()).collect();
    if parts.is_empty() {
        "report".to_string()
    } else {
        parts.join("_")
    }
}
