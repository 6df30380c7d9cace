//! Spot pairs and random spot layouts

use rand::Rng;
use rand::seq::index;

use crate::io::error::{Result, invalid_parameter};
use crate::spatial::plate::{SPOT_COUNT, Spot};

/// All unordered pairs of distinct spots, `n choose 2` of them
pub fn intra_pairs(spots: &[Spot]) -> Vec<(Spot, Spot)> {
    let mut pairs = Vec::with_capacity(pair_count(spots.len()));
    for (i, &first) in spots.iter().enumerate() {
        for &second in spots.iter().skip(i + 1) {
            pairs.push((first, second));
        }
    }
    pairs
}

/// Cartesian product of two spot lists
///
/// Both species may occupy the same spot, so pairs with a distance of zero
/// are included.
pub fn inter_pairs(spots_a: &[Spot], spots_b: &[Spot]) -> Vec<(Spot, Spot)> {
    spots_a
        .iter()
        .flat_map(|&a| spots_b.iter().map(move |&b| (a, b)))
        .collect()
}

/// Number of unordered pairs among `n` spots
pub const fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Pick `n` distinct random spots, sorted by spot number
///
/// # Errors
///
/// Returns an error if `n` exceeds the 25 spots of a plate
pub fn random_spots<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Result<Vec<Spot>> {
    if n > SPOT_COUNT {
        return Err(invalid_parameter(
            "spot count",
            &n,
            &format!("a plate has only {SPOT_COUNT} spots"),
        ));
    }

    let mut spots: Vec<Spot> = index::sample(rng, SPOT_COUNT, n)
        .into_iter()
        .filter_map(Spot::from_index)
        .collect();
    spots.sort_unstable();
    Ok(spots)
}

/// Pairs `(a, b)` with `1 <= a <= b <= max`, in lexicographic order
pub fn combinations_with_replacement(max: usize) -> Vec<(usize, usize)> {
    (1..=max)
        .flat_map(|a| (a..=max).map(move |b| (a, b)))
        .collect()
}
