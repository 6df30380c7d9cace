//! Shapiro-Wilk test for normality (Royston's algorithm AS R94)

use std::f64::consts::PI;

use rand::Rng;
use rand::seq::index;
use serde::Serialize;

use crate::io::error::{Result, computation_error, invalid_parameter};
use crate::math::probability::{normal_quantile, normal_sf, polynomial};

/// Smallest sample the test accepts
pub const MIN_SAMPLE: usize = 3;
/// Largest sample the test accepts
pub const MAX_SAMPLE: usize = 5000;

const SMALL: f64 = 1e-19;

const G: [f64; 2] = [-2.273, 0.459];
const C1: [f64; 6] = [0.0, 0.221_157, -0.147_981, -2.071_19, 4.434_685, -2.706_056];
const C2: [f64; 6] = [0.0, 0.042_981, -0.293_762, -1.752_461, 5.682_633, -3.582_633];
const C3: [f64; 4] = [0.544, -0.399_78, 0.025_054, -6.714e-4];
const C4: [f64; 4] = [1.382_2, -0.778_57, 0.062_767, -0.002_032_2];
const C5: [f64; 4] = [-1.586_1, -0.310_82, -0.083_751, 0.003_891_5];
const C6: [f64; 3] = [-0.480_3, -0.082_676, 0.003_030_2];

/// Result of a Shapiro-Wilk test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShapiroWilk {
    /// The W statistic
    pub statistic: f64,
    /// Probability of a W this small for normal data
    pub p_value: f64,
    /// Number of values tested
    pub n: usize,
}

impl ShapiroWilk {
    /// Check if normality is kept at the given alpha level
    ///
    /// A p-value equal to alpha rejects normality.
    pub fn is_normal(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// Shapiro-Wilk test of a sample of 3 to 5000 values
///
/// # Errors
///
/// Returns an error for a sample size outside 3..=5000 or when all values
/// are identical
pub fn shapiro_wilk(values: &[f64]) -> Result<ShapiroWilk> {
    let n = values.len();
    if !(MIN_SAMPLE..=MAX_SAMPLE).contains(&n) {
        return Err(invalid_parameter(
            "sample size",
            &n,
            &format!("the Shapiro-Wilk test needs {MIN_SAMPLE} to {MAX_SAMPLE} values"),
        ));
    }

    let mut x = values.to_vec();
    x.sort_by(f64::total_cmp);
    let (Some(&first), Some(&last)) = (x.first(), x.last()) else {
        return Err(computation_error("Shapiro-Wilk", &"empty sample"));
    };
    let range = last - first;
    if range < SMALL {
        return Err(computation_error("Shapiro-Wilk", &"all values are identical"));
    }

    let coefficients = full_coefficients(n);
    let scaled: Vec<f64> = x.iter().map(|value| value / range).collect();

    let an = n as f64;
    let mean_a = coefficients.iter().sum::<f64>() / an;
    let mean_x = scaled.iter().sum::<f64>() / an;
    let (mut ssa, mut ssx, mut sax) = (0.0, 0.0, 0.0);
    for (a, xi) in coefficients.iter().zip(&scaled) {
        let asa = a - mean_a;
        let xsx = xi - mean_x;
        ssa += asa * asa;
        ssx += xsx * xsx;
        sax += asa * xsx;
    }

    // 1 - W, kept separately to avoid rounding when W is close to one
    let ssassx = (ssa * ssx).sqrt();
    let w1 = (ssassx - sax) * (ssassx + sax) / (ssa * ssx);
    let statistic = 1.0 - w1;

    Ok(ShapiroWilk {
        statistic,
        p_value: p_value(n, statistic, w1),
        n,
    })
}

/// Shapiro-Wilk test that draws a random subsample from large samples
///
/// # Errors
///
/// Returns an error for fewer than 3 values or when all tested values are
/// identical
pub fn shapiro_wilk_sampled<R: Rng + ?Sized>(values: &[f64], rng: &mut R) -> Result<ShapiroWilk> {
    if values.len() <= MAX_SAMPLE {
        return shapiro_wilk(values);
    }
    let sample: Vec<f64> = index::sample(rng, values.len(), MAX_SAMPLE)
        .into_iter()
        .filter_map(|i| values.get(i).copied())
        .collect();
    shapiro_wilk(&sample)
}

/// Antisymmetric coefficient vector for a sorted sample of size `n`
fn full_coefficients(n: usize) -> Vec<f64> {
    let half = half_coefficients(n);
    (0..n)
        .map(|i| {
            let mirrored = n - 1 - i;
            if i < mirrored {
                -half.get(i).copied().unwrap_or(0.0)
            } else if i > mirrored {
                half.get(mirrored).copied().unwrap_or(0.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// Coefficients for the lower half of the sample
fn half_coefficients(n: usize) -> Vec<f64> {
    let nn2 = n / 2;
    if n == 3 {
        return vec![0.5f64.sqrt()];
    }

    let an = n as f64;
    let m: Vec<f64> = (1..=nn2)
        .map(|i| normal_quantile((i as f64 - 0.375) / (an + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|mi| mi * mi).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();

    let m1 = m.first().copied().unwrap_or(0.0);
    let m2 = m.get(1).copied().unwrap_or(0.0);
    let a1 = polynomial(rsn, &C1) - m1 / ssumm2;

    let mut a = vec![0.0; nn2];
    let (first_free, fac) = if n > 5 {
        let a2 = -m2 / ssumm2 + polynomial(rsn, &C2);
        if let Some(slot) = a.get_mut(1) {
            *slot = a2;
        }
        let fac = ((summ2 - 2.0 * m1 * m1 - 2.0 * m2 * m2)
            / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
            .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m1 * m1) / (1.0 - 2.0 * a1 * a1)).sqrt();
        (1, fac)
    };
    if let Some(slot) = a.first_mut() {
        *slot = a1;
    }
    for (slot, mi) in a.iter_mut().zip(&m).skip(first_free) {
        *slot = -mi / fac;
    }
    a
}

fn p_value(n: usize, w: f64, w1: f64) -> f64 {
    if n == 3 {
        let exact = 6.0 / PI * (w.sqrt().asin() - PI / 3.0);
        return exact.max(0.0);
    }

    let an = n as f64;
    let mut y = w1.ln();
    let (m, s) = if n <= 11 {
        let gamma = polynomial(an, &G);
        if y >= gamma {
            return 1e-99;
        }
        y = -(gamma - y).ln();
        (polynomial(an, &C3), polynomial(an, &C4).exp())
    } else {
        let ln_n = an.ln();
        (polynomial(ln_n, &C5), polynomial(ln_n, &C6).exp())
    };
    normal_sf((y - m) / s)
}
