//! Two-sample location tests and the chi-squared goodness-of-fit test
//!
//! All tests are two-sided and report their p-value the same way R does,
//! so results can be checked against `t.test`, `wilcox.test` and
//! `chisq.test`.

use serde::Serialize;

use crate::io::error::{Result, computation_error, invalid_parameter};
use crate::math::descriptive::{mean, median, rank, variance};
use crate::math::probability::{
    chi_squared_sf, normal_cdf, normal_quantile, normal_sf, students_t_cdf, students_t_quantile,
};

/// Samples smaller than this on both sides get an exact Wilcoxon p-value
pub const WILCOXON_EXACT_LIMIT: usize = 50;

/// Precision of a location shift found by bisection
const SHIFT_TOLERANCE: f64 = 1e-4;

/// Result of Welch's two-sample t-test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TTest {
    /// The t statistic
    pub statistic: f64,
    /// Welch-Satterthwaite degrees of freedom
    pub df: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// Confidence interval for the difference in means
    pub conf_int: (f64, f64),
    /// Mean of the first sample
    pub mean_x: f64,
    /// Mean of the second sample
    pub mean_y: f64,
}

/// Welch's two-sample t-test with unequal variances
///
/// # Errors
///
/// Returns an error if a sample has fewer than two values, the confidence
/// level isn't in (0, 1), or both samples are essentially constant
pub fn welch_t_test(x: &[f64], y: &[f64], conf_level: f64) -> Result<TTest> {
    if !(conf_level > 0.0 && conf_level < 1.0) {
        return Err(invalid_parameter(
            "confidence level",
            &conf_level,
            &"must be between 0 and 1",
        ));
    }
    let (Some(mean_x), Some(var_x)) = (mean(x), variance(x)) else {
        return Err(invalid_parameter("x", &x.len(), &"not enough observations"));
    };
    let (Some(mean_y), Some(var_y)) = (mean(y), variance(y)) else {
        return Err(invalid_parameter("y", &y.len(), &"not enough observations"));
    };

    let nx = x.len() as f64;
    let ny = y.len() as f64;
    let se_x = var_x / nx;
    let se_y = var_y / ny;
    let stderr = (se_x + se_y).sqrt();
    if stderr < 10.0 * f64::EPSILON * mean_x.abs().max(mean_y.abs()) || stderr == 0.0 {
        return Err(computation_error("t-test", &"data are essentially constant"));
    }

    let df = (se_x + se_y).powi(2) / (se_x.powi(2) / (nx - 1.0) + se_y.powi(2) / (ny - 1.0));
    let statistic = (mean_x - mean_y) / stderr;
    let p_value = 2.0 * students_t_cdf(-statistic.abs(), df);

    let alpha = 1.0 - conf_level;
    let margin = students_t_quantile(1.0 - alpha / 2.0, df) * stderr;
    let estimate = mean_x - mean_y;

    Ok(TTest {
        statistic,
        df,
        p_value,
        conf_int: (estimate - margin, estimate + margin),
        mean_x,
        mean_y,
    })
}

/// Result of the Wilcoxon rank-sum test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Wilcoxon {
    /// The W statistic, rank sum of the first sample minus its minimum
    pub statistic: f64,
    /// Two-sided p-value, NaN when all values are equal
    pub p_value: f64,
    /// Whether the p-value comes from the exact distribution
    pub exact: bool,
}

/// Wilcoxon rank-sum (Mann-Whitney) test
///
/// Exact when both samples have fewer than 50 values and there are no ties,
/// otherwise the normal approximation with tie and continuity correction.
///
/// # Errors
///
/// Returns an error if either sample is empty
pub fn wilcoxon_rank_sum(x: &[f64], y: &[f64]) -> Result<Wilcoxon> {
    if x.is_empty() {
        return Err(invalid_parameter("x", &0, &"not enough observations"));
    }
    if y.is_empty() {
        return Err(invalid_parameter("y", &0, &"not enough observations"));
    }

    let nx = x.len();
    let ny = y.len();
    let combined: Vec<f64> = x.iter().chain(y).copied().collect();
    let ranking = rank(&combined);
    let rank_sum: f64 = ranking.ranks.iter().take(nx).sum();
    let statistic = rank_sum - (nx * (nx + 1)) as f64 / 2.0;

    let exact = nx < WILCOXON_EXACT_LIMIT && ny < WILCOXON_EXACT_LIMIT && !ranking.has_ties();
    let p_value = if exact {
        exact_p_value(statistic, nx, ny)
    } else {
        approximate_p_value(statistic, nx, ny, ranking.tie_correction())
    };

    Ok(Wilcoxon {
        statistic,
        p_value,
        exact,
    })
}

fn exact_p_value(statistic: f64, nx: usize, ny: usize) -> f64 {
    let counts = rank_sum_counts(nx, ny);
    let total: f64 = counts.iter().sum();
    let q = statistic.round() as usize;

    let tail: f64 = if statistic > (nx * ny) as f64 / 2.0 {
        counts.iter().skip(q).sum()
    } else {
        counts.iter().take(q + 1).sum()
    };
    (2.0 * tail / total).min(1.0)
}

fn approximate_p_value(statistic: f64, nx: usize, ny: usize, tie_correction: f64) -> f64 {
    let nx_f = nx as f64;
    let ny_f = ny as f64;
    let n = nx_f + ny_f;
    let z = statistic - nx_f * ny_f / 2.0;
    let sigma = ((nx_f * ny_f / 12.0) * ((n + 1.0) - tie_correction / (n * (n - 1.0)))).sqrt();
    let correction = if z > 0.0 {
        0.5
    } else if z < 0.0 {
        -0.5
    } else {
        0.0
    };
    let z = (z - correction) / sigma;
    if z.is_nan() {
        return f64::NAN;
    }
    2.0 * normal_cdf(z).min(normal_sf(z))
}

/// Number of arrangements giving each value of the rank-sum statistic
///
/// Entry `k` counts the orderings of `m` and `n` values where exactly `k`
/// pairs have the first sample's value above the second's.
fn rank_sum_counts(m: usize, n: usize) -> Vec<f64> {
    // rows[i] holds the counts for sizes (i, j) of the current j
    let mut rows: Vec<Vec<f64>> = vec![vec![1.0]; m + 1];
    for j in 1..=n {
        let mut next: Vec<Vec<f64>> = Vec::with_capacity(m + 1);
        next.push(vec![1.0]);
        for i in 1..=m {
            let mut counts = vec![0.0; i * j + 1];
            // Largest value from the second sample
            if let Some(previous) = rows.get(i) {
                for (slot, count) in counts.iter_mut().zip(previous) {
                    *slot += count;
                }
            }
            // Largest value from the first sample beats all j others
            if let Some(previous) = next.get(i - 1) {
                for (slot, count) in counts.iter_mut().skip(j).zip(previous) {
                    *slot += count;
                }
            }
            next.push(counts);
        }
        rows = next;
    }
    rows.pop().unwrap_or_else(|| vec![1.0])
}

/// Location shift between two samples that belongs to a Wilcoxon test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationShift {
    /// Estimated difference in location of the first sample from the second
    pub estimate: f64,
    /// Confidence interval of the difference
    pub conf_int: (f64, f64),
    /// Confidence level of the interval
    pub conf_level: f64,
}

/// Estimate and confidence interval of the location shift of `x` from `y`
///
/// When the rank-sum test is exact these come from the sorted pairwise
/// differences (Hodges-Lehmann). Otherwise the normal approximation of the
/// statistic is inverted by bisection to within 1e-4.
///
/// # Errors
///
/// Returns an error if either sample is empty, the confidence level isn't
/// in (0, 1), or all values are tied
pub fn wilcoxon_location_shift(x: &[f64], y: &[f64], conf_level: f64) -> Result<LocationShift> {
    if !(conf_level > 0.0 && conf_level < 1.0) {
        return Err(invalid_parameter(
            "confidence level",
            &conf_level,
            &"must be between 0 and 1",
        ));
    }
    if x.is_empty() {
        return Err(invalid_parameter("x", &0, &"not enough observations"));
    }
    if y.is_empty() {
        return Err(invalid_parameter("y", &0, &"not enough observations"));
    }

    let combined: Vec<f64> = x.iter().chain(y).copied().collect();
    let exact = x.len() < WILCOXON_EXACT_LIMIT
        && y.len() < WILCOXON_EXACT_LIMIT
        && !rank(&combined).has_ties();
    let alpha = 1.0 - conf_level;
    let (estimate, conf_int) = if exact {
        exact_shift(x, y, alpha)?
    } else {
        approximate_shift(x, y, alpha)?
    };

    Ok(LocationShift {
        estimate,
        conf_int,
        conf_level,
    })
}

fn exact_shift(x: &[f64], y: &[f64], alpha: f64) -> Result<(f64, (f64, f64))> {
    let mut differences: Vec<f64> = x
        .iter()
        .flat_map(|a| y.iter().map(move |b| a - b))
        .collect();
    differences.sort_by(f64::total_cmp);

    let q = rank_sum_quantile(alpha / 2.0, x.len(), y.len()).max(1);
    let upper_index = x.len() * y.len() - q;
    let (Some(&lower), Some(&upper), Some(estimate)) = (
        differences.get(q - 1),
        differences.get(upper_index),
        median(&differences),
    ) else {
        return Err(computation_error("Wilcoxon interval", &"too few differences"));
    };
    Ok((estimate, (lower, upper)))
}

/// Smallest `q` with `P(W <= q) >= p` for sample sizes `m` and `n`
fn rank_sum_quantile(p: f64, m: usize, n: usize) -> usize {
    let counts = rank_sum_counts(m, n);
    let total: f64 = counts.iter().sum();
    let target = 10.0f64.mul_add(-f64::EPSILON, p);
    let mut cumulative = 0.0;
    for (q, count) in counts.iter().enumerate() {
        cumulative += count / total;
        if cumulative >= target {
            return q;
        }
    }
    counts.len().saturating_sub(1)
}

fn approximate_shift(x: &[f64], y: &[f64], alpha: f64) -> Result<(f64, (f64, f64))> {
    let min = |values: &[f64]| values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = |values: &[f64]| values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let low = min(x) - max(y);
    let high = max(x) - min(y);
    let z = normal_quantile(1.0 - alpha / 2.0);

    let lower = shift_root(x, y, (low, high), z)?;
    let upper = shift_root(x, y, (low, high), -z)?;
    let estimate = shift_root(x, y, (low, high), 0.0)?;
    Ok((estimate, (lower, upper)))
}

/// Shift `d` where the standardized statistic of `x - d` against `y` meets
/// `zq`, clamped to the bracket
fn shift_root(x: &[f64], y: &[f64], (low, high): (f64, f64), zq: f64) -> Result<f64> {
    if standardized_shift(x, y, low)? - zq <= 0.0 {
        return Ok(low);
    }
    if standardized_shift(x, y, high)? - zq >= 0.0 {
        return Ok(high);
    }

    // The statistic falls as the shift grows
    let (mut below, mut above) = (low, high);
    while above - below > SHIFT_TOLERANCE {
        let middle = f64::midpoint(below, above);
        let value = standardized_shift(x, y, middle)? - zq;
        if value > 0.0 {
            below = middle;
        } else if value < 0.0 {
            above = middle;
        } else {
            return Ok(middle);
        }
    }
    Ok(f64::midpoint(below, above))
}

/// Continuity corrected z of the rank-sum statistic of `x - shift` against `y`
fn standardized_shift(x: &[f64], y: &[f64], shift: f64) -> Result<f64> {
    let shifted: Vec<f64> = x.iter().map(|value| value - shift).chain(y.iter().copied()).collect();
    let ranking = rank(&shifted);
    let nx = x.len() as f64;
    let ny = y.len() as f64;
    let n = nx + ny;

    let rank_sum: f64 = ranking.ranks.iter().take(x.len()).sum();
    let dz = rank_sum - nx * (nx + 1.0) / 2.0 - nx * ny / 2.0;
    let correction = if dz > 0.0 {
        0.5
    } else if dz < 0.0 {
        -0.5
    } else {
        0.0
    };
    let sigma = ((nx * ny / 12.0) * ((n + 1.0) - ranking.tie_correction() / (n * (n - 1.0)))).sqrt();
    if !(sigma > 0.0) {
        return Err(computation_error(
            "Wilcoxon interval",
            &"all observations are tied",
        ));
    }
    Ok((dz - correction) / sigma)
}

/// Result of a chi-squared test for given probabilities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquared {
    /// The X-squared statistic
    pub statistic: f64,
    /// Degrees of freedom, categories minus one
    pub df: usize,
    /// Upper tail p-value
    pub p_value: f64,
    /// Expected frequency of every category
    pub expected: Vec<f64>,
}

impl ChiSquared {
    /// Smallest expected frequency for the approximation to hold
    pub const MIN_EXPECTED: f64 = 5.0;

    /// Check if any expected frequency is too small for the approximation
    pub fn has_small_expected(&self) -> bool {
        self.expected.iter().any(|&e| e < Self::MIN_EXPECTED)
    }
}

/// Chi-squared goodness-of-fit test of counts against probabilities
///
/// # Errors
///
/// Returns an error if the lengths differ, there are fewer than two
/// categories, or the probabilities are negative or don't sum to one
pub fn chi_squared_given_probabilities(
    observed: &[f64],
    probabilities: &[f64],
) -> Result<ChiSquared> {
    if observed.len() != probabilities.len() {
        return Err(invalid_parameter(
            "probabilities",
            &probabilities.len(),
            &format!("expected one per category ({})", observed.len()),
        ));
    }
    if observed.len() < 2 {
        return Err(invalid_parameter(
            "observed",
            &observed.len(),
            &"at least two categories are needed",
        ));
    }
    let probability_sum: f64 = probabilities.iter().sum();
    if probabilities.iter().any(|&p| p < 0.0) || (probability_sum - 1.0).abs() > f64::EPSILON.sqrt()
    {
        return Err(invalid_parameter(
            "probabilities",
            &probability_sum,
            &"probabilities must be non-negative and sum to 1",
        ));
    }

    let total: f64 = observed.iter().sum();
    let expected: Vec<f64> = probabilities.iter().map(|p| total * p).collect();
    let statistic = observed
        .iter()
        .zip(&expected)
        .map(|(o, e)| (o - e).powi(2) / e)
        .sum();
    let df = observed.len() - 1;

    Ok(ChiSquared {
        statistic,
        df,
        p_value: chi_squared_sf(statistic, df as f64),
        expected,
    })
}
