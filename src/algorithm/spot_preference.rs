//! Preference of a species for areas of the plate
//!
//! Per plate, the positive spots in each plate area are counted and
//! compared with the counts for the same number of randomly placed spots.

use rand::Rng;
use serde::Serialize;

use crate::algorithm::executor::AnalysisSettings;
use crate::algorithm::outcome::{GroupValues, RepeatTallies, WilcoxonOutcome, wilcoxon_outcome};
use crate::analysis::remarks::{Comparison, RemarkInput, make_remarks};
use crate::analysis::significance::{ChiSquared, chi_squared_given_probabilities};
use crate::io::error::{AnalysisError, Result};
use crate::spatial::area::{AreaDefinition, AreaTotals, PlateArea, area_totals, group_total};
use crate::spatial::combinations::random_spots;
use crate::spatial::record::PlateRecord;

/// Area groups tested with the Wilcoxon rank-sum test
pub const AREA_GROUPS: [&[PlateArea]; 8] = [
    &[PlateArea::A],
    &[PlateArea::B],
    &[PlateArea::C],
    &[PlateArea::D],
    &[PlateArea::A, PlateArea::B],
    &[PlateArea::C, PlateArea::D],
    &[PlateArea::A, PlateArea::B, PlateArea::C],
    &[PlateArea::B, PlateArea::C, PlateArea::D],
];

/// Observed and expected positive spots of one user area
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserAreaTotal {
    /// Area name
    pub name: String,
    /// Fixed areas in this user area, such as `A+B`
    pub definition: String,
    /// Positive spots over all plates
    pub observed: usize,
    /// Expected positive spots from the chi-squared test
    pub expected: Option<f64>,
}

/// Chi-squared result over the user areas
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AreaChiSquared {
    /// Test result
    pub test: ChiSquared,
    /// Summary of significance
    pub remarks: String,
}

/// Result of the spot preference analysis
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SpotPreferenceResult {
    /// Number of plates with the selected species
    pub n_plates: usize,
    /// User areas and their totals
    pub area_totals: Vec<UserAreaTotal>,
    /// Wilcoxon test per area group on the last repeat's expectations
    pub wilcoxon: Vec<WilcoxonOutcome>,
    /// Chi-squared test over the user areas, absent when unreliable
    pub chi_squared: Option<AreaChiSquared>,
    /// Wilcoxon results over all repeats
    pub repeats: RepeatTallies,
}

/// Label of an area group, such as `A+B`
pub fn group_label(group: &[PlateArea]) -> String {
    group
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("+")
}

/// Run the spot preference analysis
///
/// # Errors
///
/// Returns an error if the species wasn't found on any plate or a test
/// fails
pub fn run<R: Rng + ?Sized>(
    records: &[PlateRecord],
    areas: &AreaDefinition,
    settings: &AnalysisSettings,
    rng: &mut R,
    on_repeat: &mut dyn FnMut(usize),
) -> Result<SpotPreferenceResult> {
    let observed: Vec<AreaTotals> = records
        .iter()
        .map(|record| area_totals(record.spots.spots()))
        .collect();
    if observed.iter().flatten().all(|&total| total == 0) {
        tracing::info!("The species was not found on any plates, aborting");
        return Err(AnalysisError::EmptySelection {
            reason: "the selected species was not found on any plate".to_string(),
        });
    }
    tracing::info!(plates = records.len(), "Counted positive spots per plate area");

    let repeats = settings.repeats.max(1);
    let mut tallies = RepeatTallies {
        repeats,
        groups: Vec::new(),
    };
    let mut groups = Vec::new();
    for repeat in 1..=repeats {
        let expected = expected_totals(records, rng)?;
        groups = area_groups(&observed, &expected);
        for group in &groups {
            tallies.record(group, Comparison::PlateArea, settings.alpha_level)?;
        }
        on_repeat(repeat);
    }

    let mut wilcoxon = Vec::new();
    for group in &groups {
        if let Some(outcome) = wilcoxon_outcome(group, Comparison::PlateArea, settings.alpha_level)? {
            wilcoxon.push(outcome);
        }
    }

    let (user_areas, chi_squared) = user_area_test(&observed, areas, settings.alpha_level)?;

    Ok(SpotPreferenceResult {
        n_plates: records.len(),
        area_totals: user_areas,
        wilcoxon,
        chi_squared,
        repeats: tallies,
    })
}

fn expected_totals<R: Rng + ?Sized>(
    records: &[PlateRecord],
    rng: &mut R,
) -> Result<Vec<AreaTotals>> {
    records
        .iter()
        .map(|record| Ok(area_totals(random_spots(rng, record.positive_count())?)))
        .collect()
}

fn area_groups(observed: &[AreaTotals], expected: &[AreaTotals]) -> Vec<GroupValues> {
    AREA_GROUPS
        .iter()
        .map(|group| GroupValues {
            label: group_label(group),
            n_plates: observed.len(),
            observed: observed
                .iter()
                .map(|totals| group_total(totals, group) as f64)
                .collect(),
            expected: expected
                .iter()
                .map(|totals| group_total(totals, group) as f64)
                .collect(),
        })
        .collect()
}

fn user_area_test(
    observed: &[AreaTotals],
    areas: &AreaDefinition,
    alpha: f64,
) -> Result<(Vec<UserAreaTotal>, Option<AreaChiSquared>)> {
    let counts: Vec<usize> = areas
        .areas()
        .iter()
        .map(|area| {
            observed
                .iter()
                .map(|totals| group_total(totals, &area.areas))
                .sum()
        })
        .collect();

    let mut totals: Vec<UserAreaTotal> = areas
        .areas()
        .iter()
        .zip(&counts)
        .map(|(area, &count)| UserAreaTotal {
            name: area.name.clone(),
            definition: area.label(),
            observed: count,
            expected: None,
        })
        .collect();

    if counts.len() < 2 {
        return Ok((totals, None));
    }

    let probabilities: Vec<f64> = areas.areas().iter().map(|area| area.probability()).collect();
    let frequencies: Vec<f64> = counts.iter().map(|&count| count as f64).collect();
    let test = chi_squared_given_probabilities(&frequencies, &probabilities)?;
    if test.has_small_expected() {
        tracing::debug!("Chi-squared on user areas skipped, expected frequency below 5");
        return Ok((totals, None));
    }

    for (total, &expected) in totals.iter_mut().zip(&test.expected) {
        total.expected = Some(expected);
    }
    let remarks = make_remarks(
        &RemarkInput {
            comparison: Comparison::PlateArea,
            p_value: Some(test.p_value),
            means: None,
            n: None,
        },
        alpha,
    );
    Ok((totals, Some(AreaChiSquared { test, remarks })))
}
