//! Test outcomes per data group, shared by all analyses
//!
//! Every analysis splits its plates into groups and compares the observed
//! values of a group with values expected for randomly placed spots. The
//! helpers here run one test on one group and record the result in the
//! form reports show it.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::algorithm::consistency::ensure_equal_counts;
use crate::analysis::normality::ShapiroWilk;
use crate::analysis::remarks::{
    Comparison, Conclusion, RemarkInput, make_remarks, significant_or_false,
};
use crate::analysis::significance::{
    ChiSquared, LocationShift, TTest, Wilcoxon, chi_squared_given_probabilities,
    wilcoxon_rank_sum,
};
use crate::io::error::Result;
use crate::math::descriptive::mean;

/// Fewest values a group needs to be tested
pub const MIN_GROUP_VALUES: usize = 2;

/// Observed and expected values of one group of plates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupValues {
    /// Group label such as `A+B`, `7` or `2-24`
    pub label: String,
    /// Number of plates in the group
    pub n_plates: usize,
    /// Values measured on the plates
    pub observed: Vec<f64>,
    /// Values for random spots on the same plates
    pub expected: Vec<f64>,
}

impl GroupValues {
    /// Create an empty group
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Add the values of one plate
    pub fn add_plate(&mut self, observed: &[f64], expected: &[f64]) {
        self.n_plates += 1;
        self.observed.extend_from_slice(observed);
        self.expected.extend_from_slice(expected);
    }

    /// Check the counts and return a summary if the group can be tested
    ///
    /// # Errors
    ///
    /// Returns an error if the observed and expected counts differ
    pub fn summary(&self) -> Result<Option<GroupSummary>> {
        ensure_equal_counts(&self.label, &self.observed, &self.expected)?;
        if self.observed.len() < MIN_GROUP_VALUES {
            return Ok(None);
        }
        let (Some(mean_observed), Some(mean_expected)) =
            (mean(&self.observed), mean(&self.expected))
        else {
            return Ok(None);
        };
        Ok(Some(GroupSummary {
            group: self.label.clone(),
            n_plates: self.n_plates,
            n_values: self.observed.len(),
            mean_observed,
            mean_expected,
        }))
    }
}

/// Size and means of a tested group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    /// Group label
    pub group: String,
    /// Number of plates
    pub n_plates: usize,
    /// Number of observed values
    pub n_values: usize,
    /// Mean of the observed values
    pub mean_observed: f64,
    /// Mean of the expected values
    pub mean_expected: f64,
}

impl GroupSummary {
    fn remarks(&self, comparison: Comparison, p_value: f64, alpha: f64) -> String {
        make_remarks(
            &RemarkInput {
                comparison,
                p_value: Some(p_value),
                means: Some((self.mean_observed, self.mean_expected)),
                n: Some(self.n_values),
            },
            alpha,
        )
    }
}

/// Wilcoxon rank-sum result for a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WilcoxonOutcome {
    /// Group size and means
    #[serde(flatten)]
    pub summary: GroupSummary,
    /// Test result
    pub test: Wilcoxon,
    /// Estimated shift of observed from expected, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<LocationShift>,
    /// Summary of significance and direction
    pub remarks: String,
}

/// Welch t-test result for a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TTestOutcome {
    /// Group size and means
    #[serde(flatten)]
    pub summary: GroupSummary,
    /// Test result
    pub test: TTest,
    /// Summary of significance and direction
    pub remarks: String,
}

/// Location test chosen for a group by its normality
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum LocationOutcome {
    /// Welch t-test on normal data
    TTest(TTestOutcome),
    /// Wilcoxon rank-sum test otherwise
    Wilcoxon(WilcoxonOutcome),
}

impl LocationOutcome {
    /// p-value of the test that ran
    pub const fn p_value(&self) -> f64 {
        match self {
            Self::TTest(outcome) => outcome.test.p_value,
            Self::Wilcoxon(outcome) => outcome.test.p_value,
        }
    }

    /// Group size and means
    pub const fn summary(&self) -> &GroupSummary {
        match self {
            Self::TTest(outcome) => &outcome.summary,
            Self::Wilcoxon(outcome) => &outcome.summary,
        }
    }
    /// Confidence interval of the difference between observed and expected
    pub fn conf_int(&self) -> Option<(f64, f64)> {
        match self {
            Self::TTest(outcome) => Some(outcome.test.conf_int),
            Self::Wilcoxon(outcome) => outcome.shift.map(|shift| shift.conf_int),
        }
    }
}

/// Shapiro-Wilk result on the observed values of a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalityOutcome {
    /// Group label
    pub group: String,
    /// Test result, absent for too few or identical values
    pub test: Option<ShapiroWilk>,
    /// Whether the data were treated as normal
    pub normal: bool,
}

/// Chi-squared result for a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquaredOutcome {
    /// Group size and means
    #[serde(flatten)]
    pub summary: GroupSummary,
    /// Test result
    pub test: ChiSquared,
    /// Summary of significance and direction
    pub remarks: String,
}

/// Run the Wilcoxon rank-sum test on a group
///
/// Returns `None` for a group with too few values.
///
/// # Errors
///
/// Returns an error if the observed and expected counts differ
pub fn wilcoxon_outcome(
    group: &GroupValues,
    comparison: Comparison,
    alpha: f64,
) -> Result<Option<WilcoxonOutcome>> {
    let Some(summary) = group.summary()? else {
        return Ok(None);
    };
    let test = wilcoxon_rank_sum(&group.observed, &group.expected)?;
    tracing::debug!(
        group = %summary.group,
        n = summary.n_values,
        p = test.p_value,
        "Wilcoxon rank-sum test"
    );
    let remarks = summary.remarks(comparison, test.p_value, alpha);
    Ok(Some(WilcoxonOutcome {
        summary,
        test,
        shift: None,
        remarks,
    }))
}

/// Wrap a finished t-test with its group summary
pub fn t_test_outcome(
    summary: GroupSummary,
    test: TTest,
    comparison: Comparison,
    alpha: f64,
) -> TTestOutcome {
    let remarks = summary.remarks(comparison, test.p_value, alpha);
    TTestOutcome {
        summary,
        test,
        remarks,
    }
}

/// Run the chi-squared test of observed category counts of a group
///
/// Returns `None` for a group with too few values, or when an expected
/// frequency is below five and the result isn't reliable.
///
/// # Errors
///
/// Returns an error if the observed and expected counts differ or the
/// probabilities are invalid
pub fn chi_squared_outcome(
    group: &GroupValues,
    counts: &[f64],
    probabilities: &[f64],
    comparison: Comparison,
    alpha: f64,
) -> Result<Option<ChiSquaredOutcome>> {
    let Some(summary) = group.summary()? else {
        return Ok(None);
    };
    let test = chi_squared_given_probabilities(counts, probabilities)?;
    if test.has_small_expected() {
        tracing::debug!(group = %summary.group, "Chi-squared skipped, expected frequency below 5");
        return Ok(None);
    }
    let remarks = summary.remarks(comparison, test.p_value, alpha);
    Ok(Some(ChiSquaredOutcome {
        summary,
        test,
        remarks,
    }))
}

/// Significant results of one group over all repeats
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatTally {
    /// Group label
    pub group: String,
    /// Number of plates
    pub n_plates: usize,
    /// Number of observed values
    pub n_values: usize,
    /// Repeats with a significant result
    pub n_significant: usize,
    /// Significant repeats per direction
    pub conclusions: BTreeMap<Conclusion, usize>,
}

impl RepeatTally {
    /// Count of the direction found most often, `None` if nothing was significant
    pub fn major(&self) -> Option<(Conclusion, usize)> {
        self.conclusions
            .iter()
            .max_by_key(|&(_, &count)| count)
            .map(|(&conclusion, &count)| (conclusion, count))
    }

    /// Probability that the major direction was found by chance
    ///
    /// Directions contradict each other, so only the major one counts.
    pub fn summary_p_value(&self, repeats: usize) -> f64 {
        let major = self.major().map_or(0, |(_, count)| count);
        1.0 - major as f64 / repeats.max(1) as f64
    }
}

/// Repeat tallies of all groups of an analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepeatTallies {
    /// Number of repeats performed
    pub repeats: usize,
    /// Tallies in group order
    pub groups: Vec<RepeatTally>,
}

impl RepeatTallies {
    /// Run the Wilcoxon test on a group and count a significant result
    ///
    /// # Errors
    ///
    /// Returns an error if the observed and expected counts differ
    pub fn record(&mut self, group: &GroupValues, comparison: Comparison, alpha: f64) -> Result<()> {
        let Some(summary) = group.summary()? else {
            return Ok(());
        };
        let test = wilcoxon_rank_sum(&group.observed, &group.expected)?;

        let index = if let Some(index) = self.groups.iter().position(|t| t.group == summary.group)
        {
            index
        } else {
            self.groups.push(RepeatTally {
                group: summary.group.clone(),
                n_plates: summary.n_plates,
                n_values: summary.n_values,
                n_significant: 0,
                conclusions: BTreeMap::new(),
            });
            self.groups.len() - 1
        };

        if !significant_or_false(test.p_value, alpha) {
            return Ok(());
        }
        if let Some(tally) = self.groups.get_mut(index) {
            tally.n_significant += 1;
            let conclusion =
                Conclusion::from_means(comparison, summary.mean_observed, summary.mean_expected);
            *tally.conclusions.entry(conclusion).or_insert(0) += 1;
        }
        Ok(())
    }

    /// Tally of a group by label
    pub fn get(&self, group: &str) -> Option<&RepeatTally> {
        self.groups.iter().find(|tally| tally.group == group)
    }
}
