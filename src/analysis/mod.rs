//! Statistical tests and the interpretation of their results

/// Shapiro-Wilk normality test
pub mod normality;
/// Significance decisions and result remarks
pub mod remarks;
/// t-test, Wilcoxon rank-sum and chi-squared tests
pub mod significance;
