//! Significance decisions and the short remarks shown next to test results

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::io::error::{Result, computation_error};

/// Sample sizes above this are flagged as large in remarks
pub const LARGE_SAMPLE: usize = 20;

/// Check whether a p-value is significant at the given alpha level
///
/// # Errors
///
/// Returns an error for a NaN p-value, which tests produce when all values
/// are equal
pub fn is_significant(p_value: f64, alpha: f64) -> Result<bool> {
    if p_value.is_nan() {
        return Err(computation_error(
            "significance",
            &"p-value is NaN, the test values were all equal",
        ));
    }
    Ok(p_value < alpha)
}

/// Like [`is_significant`], with a NaN p-value counting as not significant
pub fn significant_or_false(p_value: f64, alpha: f64) -> bool {
    is_significant(p_value, alpha).unwrap_or(false)
}

/// What is being compared, which decides the words used for a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Positive spot totals per plate area
    PlateArea,
    /// Distances between spots
    SpotDistance,
}

/// Direction of a significant difference
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    /// Spots lie closer together than expected
    Attraction,
    /// Spots lie further apart than expected
    Repulsion,
    /// A plate area has more positive spots than expected
    Preference,
    /// A plate area has fewer positive spots than expected
    Rejection,
}

impl Conclusion {
    /// Direction implied by the observed and expected means
    ///
    /// Short distances mean attraction, high area totals mean preference.
    pub fn from_means(comparison: Comparison, mean_observed: f64, mean_expected: f64) -> Self {
        match comparison {
            Comparison::PlateArea if mean_observed > mean_expected => Self::Preference,
            Comparison::PlateArea => Self::Rejection,
            Comparison::SpotDistance if mean_observed < mean_expected => Self::Attraction,
            Comparison::SpotDistance => Self::Repulsion,
        }
    }

    /// Two-letter code used in batch summaries
    pub const fn code(self) -> &'static str {
        match self {
            Self::Attraction => "at",
            Self::Repulsion => "rp",
            Self::Preference => "pr",
            Self::Rejection => "rj",
        }
    }
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Self::Attraction => "Attraction",
            Self::Repulsion => "Repulsion",
            Self::Preference => "Preference",
            Self::Rejection => "Rejection",
        };
        f.write_str(word)
    }
}

/// Inputs summarised by [`make_remarks`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemarkInput {
    /// What was compared
    pub comparison: Comparison,
    /// Test p-value, if the test produced one
    pub p_value: Option<f64>,
    /// Observed and expected means
    pub means: Option<(f64, f64)>,
    /// Number of values tested
    pub n: Option<usize>,
}

/// Summarise a test result as `Significant; Attraction; P < 0.01; n > 20`
pub fn make_remarks(input: &RemarkInput, alpha: f64) -> String {
    let mut remarks: Vec<String> = Vec::new();

    if let Some(p_value) = input.p_value {
        if significant_or_false(p_value, alpha) {
            remarks.push("Significant".to_string());
            if let Some((observed, expected)) = input.means {
                remarks.push(Conclusion::from_means(input.comparison, observed, expected).to_string());
            }
        } else {
            remarks.push("Not significant".to_string());
        }

        if !p_value.is_nan() {
            remarks.push(p_value_bucket(p_value).to_string());
        }
    }

    if let Some(n) = input.n {
        remarks.push(if n > LARGE_SAMPLE { "n > 20" } else { "n < 20" }.to_string());
    }

    remarks.join("; ")
}

fn p_value_bucket(p_value: f64) -> &'static str {
    if p_value < 0.001 {
        "P < 0.001"
    } else if p_value < 0.01 {
        "P < 0.01"
    } else if p_value < 0.05 {
        "P < 0.05"
    } else {
        "P > 0.05"
    }
}
