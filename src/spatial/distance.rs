//! Distances between spots and their expected distribution on a plate
//!
//! Distances are Euclidean in spot units, rounded to two decimals. Grouping
//! and frequency counts use [`DistanceKey`], the distance in hundredths, so
//! equal distances compare exactly.

use std::collections::BTreeMap;
use std::fmt;

use ndarray::Array2;
use serde::Serialize;

use crate::io::error::{Result, invalid_source};
use crate::spatial::combinations::{inter_pairs, intra_pairs};
use crate::spatial::plate::{PLATE_SIDE, PositionDifference, Spot};

/// Distances indexed by `[vertical][horizontal]` offset
const DISTANCE_LOOKUP: [[f64; PLATE_SIDE]; PLATE_SIDE] = [
    [0.0, 1.0, 2.0, 3.0, 4.0],
    [1.0, 1.41, 2.24, 3.16, 4.12],
    [2.0, 2.24, 2.83, 3.61, 4.47],
    [3.0, 3.16, 3.61, 4.24, 5.0],
    [4.0, 4.12, 4.47, 5.0, 5.66],
];

/// Round to two decimals
fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Distance for a horizontal and vertical offset
pub fn distance(horizontal: usize, vertical: usize) -> f64 {
    let squared = horizontal * horizontal + vertical * vertical;
    round_hundredths((squared as f64).sqrt())
}

/// Distance between two spots
///
/// Symmetric, and zero only when both spots are the same.
pub fn spot_distance(a: Spot, b: Spot) -> f64 {
    let PositionDifference {
        horizontal,
        vertical,
    } = a.position_difference(b);
    distance(horizontal, vertical)
}

/// Precomputed distances for every offset on a plate
///
/// Kept as the reference the arithmetic [`distance`] is checked and
/// benchmarked against.
#[derive(Clone, Debug)]
pub struct DistanceTable {
    table: Array2<f64>,
}

impl Default for DistanceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DistanceTable {
    /// Build the 5x5 lookup table
    pub fn new() -> Self {
        let table = Array2::from_shape_fn((PLATE_SIDE, PLATE_SIDE), |(vertical, horizontal)| {
            DISTANCE_LOOKUP
                .get(vertical)
                .and_then(|row| row.get(horizontal))
                .copied()
                .unwrap_or(f64::NAN)
        });
        Self { table }
    }

    /// Look up the distance for an offset, `None` if it's off the plate
    pub fn lookup(&self, difference: PositionDifference) -> Option<f64> {
        self.table
            .get([difference.vertical, difference.horizontal])
            .copied()
    }
}

/// A spot distance in hundredths, usable as an exact map key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "f64")]
pub struct DistanceKey(u32);

impl DistanceKey {
    /// Key of a distance rounded to two decimals
    pub fn from_distance(distance: f64) -> Self {
        Self((distance * 100.0).round().max(0.0) as u32)
    }

    /// Distance value of this key
    pub fn value(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl From<DistanceKey> for f64 {
    fn from(key: DistanceKey) -> Self {
        key.value()
    }
}

impl fmt::Display for DistanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.value())
    }
}

/// Which layout of spot pairs distances are taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceKind {
    /// Unordered pairs of distinct spots of one species
    Intra,
    /// Ordered pairs of spots of two species, the same spot allowed
    Inter,
}

impl DistanceKind {
    fn all_pairs(self) -> Vec<(Spot, Spot)> {
        let spots: Vec<Spot> = Spot::all().collect();
        match self {
            Self::Intra => intra_pairs(&spots),
            Self::Inter => inter_pairs(&spots, &spots),
        }
    }
}

/// Distances between all intra pairs of `spots`
pub fn intra_distances(spots: &[Spot]) -> Vec<f64> {
    intra_pairs(spots)
        .into_iter()
        .map(|(a, b)| spot_distance(a, b))
        .collect()
}

/// Distances between all inter pairs of `spots_a` and `spots_b`
pub fn inter_distances(spots_a: &[Spot], spots_b: &[Spot]) -> Vec<f64> {
    inter_pairs(spots_a, spots_b)
        .into_iter()
        .map(|(a, b)| spot_distance(a, b))
        .collect()
}

/// Number of spot pairs on a full plate per possible distance
pub fn distance_counts(kind: DistanceKind) -> BTreeMap<DistanceKey, usize> {
    let mut counts = BTreeMap::new();
    for (a, b) in kind.all_pairs() {
        *counts
            .entry(DistanceKey::from_distance(spot_distance(a, b)))
            .or_insert(0) += 1;
    }
    counts
}

/// Probability of each possible distance for randomly placed spots
///
/// 300 pairs for intra distances and 625 for inter distances, so the
/// probabilities of a kind sum to one.
pub fn distance_probabilities(kind: DistanceKind) -> BTreeMap<DistanceKey, f64> {
    let counts = distance_counts(kind);
    let total: usize = counts.values().sum();
    counts
        .into_iter()
        .map(|(key, count)| (key, count as f64 / total as f64))
        .collect()
}

/// Count the occurrences of every possible distance in `distances`
///
/// Every possible distance of `kind` is present in the result, with zero
/// when it doesn't occur.
///
/// # Errors
///
/// Returns an error if a distance can't occur on a plate for `kind`
pub fn distance_frequency(
    distances: &[f64],
    kind: DistanceKind,
) -> Result<BTreeMap<DistanceKey, usize>> {
    let mut frequencies: BTreeMap<DistanceKey, usize> =
        distance_counts(kind).into_keys().map(|key| (key, 0)).collect();

    for &value in distances {
        let key = DistanceKey::from_distance(value);
        let Some(count) = frequencies.get_mut(&key) else {
            return Err(invalid_source(&format!(
                "unknown spot distance {value} for {kind:?} distances"
            )));
        };
        *count += 1;
    }
    Ok(frequencies)
}
