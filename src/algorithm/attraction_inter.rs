//! Attraction or repulsion between two species
//!
//! Distances between the positive spots of the first and the second
//! selection on the same plate are compared with distances between random
//! spots. Plates are grouped by the ratio of positive spot counts of both
//! selections.

use std::collections::{BTreeSet, HashMap};

use rand::Rng;
use serde::Serialize;

use crate::algorithm::executor::AnalysisSettings;
use crate::algorithm::outcome::{
    ChiSquaredOutcome, GroupValues, RepeatTallies, WilcoxonOutcome, chi_squared_outcome,
    wilcoxon_outcome,
};
use crate::analysis::remarks::Comparison;
use crate::io::error::{AnalysisError, Result};
use crate::spatial::combinations::{combinations_with_replacement, random_spots};
use crate::spatial::distance::{
    DistanceKind, distance_frequency, distance_probabilities, inter_distances,
};
use crate::spatial::plate::{SPOT_COUNT, Spot};
use crate::spatial::record::PlateRecord;

/// Number of ratio groups before the group of all ratios
pub const RATIO_GROUP_COUNT: usize = 5;
/// Growth of the largest spot count from one ratio group to the next
pub const RATIO_GROUP_STEP: usize = 5;

/// Plates whose positive spot counts form one of a set of ratios
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RatioGroup {
    /// Group label, `1` to `5` or `1-5` for all ratios
    pub label: String,
    /// Ratios `(low, high)` in the group; `a:b` matches `b:a` as well
    pub ratios: BTreeSet<(usize, usize)>,
}

impl RatioGroup {
    /// Check if a plate with these counts belongs to the group
    pub fn contains(&self, count_a: usize, count_b: usize) -> bool {
        self.ratios
            .contains(&(count_a.min(count_b), count_a.max(count_b)))
    }
}

/// Ratio groups in test order
///
/// Group `k` holds the ratios with both counts up to `5k` not in an earlier
/// group. The last group holds every ratio. A 25:25 plate is always random
/// and belongs to no group.
pub fn ratio_groups() -> Vec<RatioGroup> {
    let full = (SPOT_COUNT, SPOT_COUNT);
    let mut groups = Vec::with_capacity(RATIO_GROUP_COUNT + 1);
    let mut earlier: BTreeSet<(usize, usize)> = BTreeSet::new();

    for k in 1..=RATIO_GROUP_COUNT {
        let ratios: BTreeSet<(usize, usize)> =
            combinations_with_replacement(k * RATIO_GROUP_STEP)
                .into_iter()
                .filter(|ratio| !earlier.contains(ratio) && *ratio != full)
                .collect();
        earlier.extend(ratios.iter().copied());
        groups.push(RatioGroup {
            label: k.to_string(),
            ratios,
        });
    }

    groups.push(RatioGroup {
        label: format!("1-{RATIO_GROUP_COUNT}"),
        ratios: combinations_with_replacement(SPOT_COUNT)
            .into_iter()
            .filter(|&ratio| ratio != full)
            .collect(),
    });
    groups
}

/// Result of the inter-specific attraction analysis
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InterResult {
    /// Number of plates shared by both selections
    pub n_plates: usize,
    /// Wilcoxon test per ratio group on the last repeat's expectations
    pub wilcoxon: Vec<WilcoxonOutcome>,
    /// Chi-squared test of the observed distance frequencies per group
    pub chi_squared: Vec<ChiSquaredOutcome>,
    /// Wilcoxon results over all repeats
    pub repeats: RepeatTallies,
}

struct SharedPlate {
    count_a: usize,
    count_b: usize,
    observed: Vec<f64>,
}

/// Pair records of both selections found on the same plate
///
/// Plates where neither selection has a positive spot are left out.
fn shared_plates(first: &[PlateRecord], second: &[PlateRecord]) -> Vec<SharedPlate> {
    let second_by_plate: HashMap<u32, &PlateRecord> =
        second.iter().map(|record| (record.plate_id, record)).collect();

    first
        .iter()
        .filter_map(|a| second_by_plate.get(&a.plate_id).map(|b| (a, *b)))
        .filter(|(a, b)| a.positive_count() >= 1 || b.positive_count() >= 1)
        .map(|(a, b)| {
            let spots_a: Vec<Spot> = a.spots.spots().collect();
            let spots_b: Vec<Spot> = b.spots.spots().collect();
            SharedPlate {
                count_a: spots_a.len(),
                count_b: spots_b.len(),
                observed: inter_distances(&spots_a, &spots_b),
            }
        })
        .collect()
}

/// Run the inter-specific attraction analysis
///
/// # Errors
///
/// Returns an error if the selections share no plates or a test fails
pub fn run<R: Rng + ?Sized>(
    first: &[PlateRecord],
    second: &[PlateRecord],
    settings: &AnalysisSettings,
    rng: &mut R,
    on_repeat: &mut dyn FnMut(usize),
) -> Result<InterResult> {
    let plates = shared_plates(first, second);
    tracing::info!(plates = plates.len(), "Calculated inter-specific distances");
    if plates.is_empty() {
        return Err(AnalysisError::EmptySelection {
            reason: "the species selections share no plates".to_string(),
        });
    }

    let ratio_groups = ratio_groups();
    let repeats = settings.repeats.max(1);
    let mut tallies = RepeatTallies {
        repeats,
        groups: Vec::new(),
    };
    let mut groups = Vec::new();
    for repeat in 1..=repeats {
        let expected = plates
            .iter()
            .map(|plate| {
                let spots_a = random_spots(rng, plate.count_a)?;
                let spots_b = random_spots(rng, plate.count_b)?;
                Ok(inter_distances(&spots_a, &spots_b))
            })
            .collect::<Result<Vec<_>>>()?;
        groups = ratio_group_values(&ratio_groups, &plates, &expected);
        for group in &groups {
            tallies.record(group, Comparison::SpotDistance, settings.alpha_level)?;
        }
        on_repeat(repeat);
    }

    let probabilities: Vec<f64> = distance_probabilities(DistanceKind::Inter)
        .into_values()
        .collect();
    let mut wilcoxon = Vec::new();
    let mut chi_squared = Vec::new();
    for group in &groups {
        wilcoxon.extend(wilcoxon_outcome(
            group,
            Comparison::SpotDistance,
            settings.alpha_level,
        )?);

        let frequencies: Vec<f64> = distance_frequency(&group.observed, DistanceKind::Inter)?
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

    Ok(InterResult {
        n_plates: plates.len(),
        wilcoxon,
        chi_squared,
        repeats: tallies,
    })
}

fn ratio_group_values(
    ratio_groups: &[RatioGroup],
    plates: &[SharedPlate],
    expected: &[Vec<f64>],
) -> Vec<GroupValues> {
    ratio_groups
        .iter()
        .map(|ratio_group| {
            let mut group = GroupValues::new(ratio_group.label.clone());
            for (plate, expected) in plates.iter().zip(expected) {
                if ratio_group.contains(plate.count_a, plate.count_b) {
                    group.add_plate(&plate.observed, expected);
                }
            }
            group
        })
        .collect()
}
