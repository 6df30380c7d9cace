//! Mathematical utilities for the statistical tests

/// Means, medians, variances and ranks
pub mod descriptive;
/// Probability distributions and special functions
pub mod probability;
