//! Attraction or repulsion between individuals of one species
//!
//! Distances between the positive spots of each plate are compared with
//! the distances between the same number of randomly placed spots. Plates
//! are grouped by their number of positive spots, since plates with many
//! positive spots always look random.

use rand::Rng;
use serde::Serialize;

use crate::algorithm::executor::AnalysisSettings;
use crate::algorithm::outcome::{
    ChiSquaredOutcome, GroupValues, LocationOutcome, NormalityOutcome, RepeatTallies,
    chi_squared_outcome, t_test_outcome, wilcoxon_outcome,
};
use crate::analysis::normality::{MIN_SAMPLE, shapiro_wilk_sampled};
use crate::analysis::remarks::Comparison;
use crate::analysis::significance::{welch_t_test, wilcoxon_location_shift};
use crate::io::error::{AnalysisError, Result};
use crate::spatial::combinations::random_spots;
use crate::spatial::distance::{
    DistanceKind, distance_frequency, distance_probabilities, intra_distances,
};
use crate::spatial::plate::Spot;
use crate::spatial::record::PlateRecord;

/// Fewest positive spots a plate needs to have distances
pub const MIN_PLATE_SPOTS: usize = 2;
/// Most positive spots of a tested plate; full plates always match random
pub const MAX_PLATE_SPOTS: usize = 24;

/// Result of the intra-specific attraction analysis
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IntraResult {
    /// Number of plates with at least two positive spots
    pub n_plates: usize,
    /// Normality of the observed distances per group
    pub normality: Vec<NormalityOutcome>,
    /// t-test or Wilcoxon test per group on the last repeat's expectations
    pub location: Vec<LocationOutcome>,
    /// Chi-squared test of the observed distance frequencies per group
    pub chi_squared: Vec<ChiSquaredOutcome>,
    /// Wilcoxon results over all repeats
    pub repeats: RepeatTallies,
}

struct PlateDistances {
    n_spots: usize,
    observed: Vec<f64>,
}

/// Label of the group holding every tested plate
pub fn combined_label() -> String {
    format!("{MIN_PLATE_SPOTS}-{MAX_PLATE_SPOTS}")
}

/// Run the intra-specific attraction analysis
///
/// # Errors
///
/// Returns an error if no plate has two positive spots or a test fails
pub fn run<R: Rng + ?Sized>(
    records: &[PlateRecord],
    settings: &AnalysisSettings,
    rng: &mut R,
    on_repeat: &mut dyn FnMut(usize),
) -> Result<IntraResult> {
    let plates: Vec<PlateDistances> = records
        .iter()
        .filter(|record| record.positive_count() >= MIN_PLATE_SPOTS)
        .map(|record| {
            let spots: Vec<Spot> = record.spots.spots().collect();
            PlateDistances {
                n_spots: spots.len(),
                observed: intra_distances(&spots),
            }
        })
        .collect();
    let skipped = records.len() - plates.len();
    tracing::info!(
        plates = plates.len(),
        skipped,
        "Calculated intra-specific distances"
    );
    if plates.is_empty() {
        return Err(AnalysisError::EmptySelection {
            reason: format!("no plate has at least {MIN_PLATE_SPOTS} positive spots"),
        });
    }

    let repeats = settings.repeats.max(1);
    let mut tallies = RepeatTallies {
        repeats,
        groups: Vec::new(),
    };
    let mut groups = Vec::new();
    for repeat in 1..=repeats {
        let expected = plates
            .iter()
            .map(|plate| Ok(intra_distances(&random_spots(rng, plate.n_spots)?)))
            .collect::<Result<Vec<_>>>()?;
        groups = spot_groups(&plates, &expected);
        for group in &groups {
            tallies.record(group, Comparison::SpotDistance, settings.alpha_level)?;
        }
        on_repeat(repeat);
    }

    let probabilities: Vec<f64> = distance_probabilities(DistanceKind::Intra)
        .into_values()
        .collect();
    let mut normality = Vec::new();
    let mut location = Vec::new();
    let mut chi_squared = Vec::new();
    for group in &groups {
        let Some(summary) = group.summary()? else {
            continue;
        };

        let shapiro = if group.observed.len() >= MIN_SAMPLE {
            shapiro_wilk_sampled(&group.observed, rng).ok()
        } else {
            None
        };
        let normal = shapiro.is_some_and(|test| test.is_normal(settings.normality_alpha));
        normality.push(NormalityOutcome {
            group: group.label.clone(),
            test: shapiro,
            normal,
        });

        let t_test = if normal {
            welch_t_test(&group.observed, &group.expected, settings.conf_level()).ok()
        } else {
            None
        };
        let outcome = match t_test {
            Some(test) => Some(LocationOutcome::TTest(t_test_outcome(
                summary,
                test,
                Comparison::SpotDistance,
                settings.alpha_level,
            ))),
            None => wilcoxon_outcome(group, Comparison::SpotDistance, settings.alpha_level)?
                .map(|mut outcome| {
                    outcome.shift = wilcoxon_location_shift(
                        &group.observed,
                        &group.expected,
                        settings.conf_level(),
                    )
                    .ok();
                    LocationOutcome::Wilcoxon(outcome)
                }),
        };
        location.extend(outcome);

        let frequencies: Vec<f64> = distance_frequency(&group.observed, DistanceKind::Intra)?
            .into_values()
            .map(|count| count as f64)
            .collect();
        chi_squared.extend(chi_squared_outcome(
            group,
            &frequencies,
            &probabilities,
            Comparison::SpotDistance,
            settings.alpha_level,
        )?);
    }

    Ok(IntraResult {
        n_plates: plates.len(),
        normality,
        location,
        chi_squared,
        repeats: tallies,
    })
}

fn spot_groups(plates: &[PlateDistances], expected: &[Vec<f64>]) -> Vec<GroupValues> {
    let mut groups: Vec<GroupValues> = (MIN_PLATE_SPOTS..=MAX_PLATE_SPOTS)
        .map(|n| GroupValues::new(n.to_string()))
        .collect();
    let mut combined = GroupValues::new(combined_label());

    for (plate, expected) in plates.iter().zip(expected) {
        if plate.n_spots > MAX_PLATE_SPOTS {
            continue;
        }
        if let Some(group) = groups.get_mut(plate.n_spots - MIN_PLATE_SPOTS) {
            group.add_plate(&plate.observed, expected);
        }
        combined.add_plate(&plate.observed, expected);
    }

    groups.push(combined);
    groups
}
