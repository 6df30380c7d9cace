//! Descriptive statistics over samples

use num_traits::ToPrimitive;

/// Arithmetic mean, `None` for an empty sample
pub fn mean<T: ToPrimitive + Copy>(values: &[T]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().filter_map(|value| value.to_f64()).sum();
    Some(sum / values.len() as f64)
}

/// Median of a sample, `None` when empty
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted.get(middle).copied()
    } else {
        let upper = sorted.get(middle)?;
        let lower = sorted.get(middle.checked_sub(1)?)?;
        Some(f64::midpoint(*lower, *upper))
    }
}

/// Sample variance with `n - 1` denominator, `None` for fewer than two values
pub fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let squares: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
    Some(squares / (values.len() - 1) as f64)
}

/// Ranks of a sample with ties
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// One-based rank of every value in input order, ties get the mean rank
    pub ranks: Vec<f64>,
    /// Size of every group of tied values, singletons excluded
    pub ties: Vec<usize>,
}

impl Ranking {
    /// Check if any values were tied
    pub fn has_ties(&self) -> bool {
        !self.ties.is_empty()
    }

    /// Tie correction term `sum(t³ - t)` over the tie groups
    pub fn tie_correction(&self) -> f64 {
        self.ties
            .iter()
            .map(|&t| {
                let t = t as f64;
                t.powi(3) - t
            })
            .sum()
    }
}

/// Rank values in ascending order, averaging the ranks of ties
pub fn rank(values: &[f64]) -> Ranking {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        let left = values.get(a).copied().unwrap_or(f64::NAN);
        let right = values.get(b).copied().unwrap_or(f64::NAN);
        left.total_cmp(&right)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut ties = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let value = order.get(start).and_then(|&i| values.get(i)).copied();
        let mut end = start + 1;
        while end < order.len() && order.get(end).and_then(|&i| values.get(i)).copied() == value
        {
            end += 1;
        }

        // Positions start..end share the mean of ranks start+1..=end
        let shared = (start + 1 + end) as f64 / 2.0;
        for &index in order.get(start..end).unwrap_or(&[]) {
            if let Some(rank) = ranks.get_mut(index) {
                *rank = shared;
            }
        }
        if end - start > 1 {
            ties.push(end - start);
        }
        start = end;
    }

    Ranking { ranks, ties }
}
