//! Guard for observed and expected value pairs
//!
//! Expected values are generated one for one from the observed plates, so a
//! count mismatch is a defect in this crate and never retried.

use crate::io::error::{AnalysisError, Result};

/// Fail unless `observed` and `expected` hold the same number of values
///
/// # Errors
///
/// Returns [`AnalysisError::CountMismatch`] when the lengths differ
pub fn ensure_equal_counts<T, U>(context: &str, observed: &[T], expected: &[U]) -> Result<()> {
    if observed.len() == expected.len() {
        Ok(())
    } else {
        tracing::error!(
            context,
            observed = observed.len(),
            expected = expected.len(),
            "Observed and expected value counts differ"
        );
        Err(AnalysisError::CountMismatch {
            context: context.to_string(),
            observed: observed.len(),
            expected: expected.len(),
        })
    }
}
