//! Error types and context helpers for analysis operations

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Main error type for all analysis operations
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Failed to open or parse a CSV data file
    #[error("Failed to read data file '{}': {source}", .path.display())]
    DataLoad {
        /// Path to the data file
        path: PathBuf,
        /// Underlying CSV error
        source: csv::Error,
    },

    /// A data row could not be interpreted
    #[error("Malformed row {line} in '{}': {reason}", .path.display())]
    MalformedRow {
        /// Path to the data file
        path: PathBuf,
        /// One-based line number of the row
        line: u64,
        /// Description of what's wrong with the row
        reason: String,
    },

    /// Source data doesn't meet analysis requirements
    #[error("Invalid source data: {reason}")]
    InvalidSourceData {
        /// Description of what's wrong with the source data
        reason: String,
    },

    /// Spot number outside the 25 spots of a plate
    #[error("Spot number {number} is not on the plate (expected 1 to 25)")]
    InvalidSpot {
        /// The rejected spot number
        number: usize,
    },

    /// Parameter validation failed
    #[error("Invalid parameter '{parameter}' = '{value}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// The selection produced nothing to analyse
    #[error("Empty selection: {reason}")]
    EmptySelection {
        /// Why the selection could not be analysed
        reason: String,
    },

    /// Observed and expected value counts diverged
    ///
    /// Expected values are generated from the observed plates one for one,
    /// so this is never caused by user input.
    #[error(
        "Internal defect in {context}: {observed} observed and {expected} expected values, \
         these counts must always be equal"
    )]
    CountMismatch {
        /// Group or step where the mismatch was detected
        context: String,
        /// Number of observed values
        observed: usize,
        /// Number of expected values
        expected: usize,
    },

    /// Failed to save an exported image to disk
    #[error("Failed to export image to '{}': {source}", .path.display())]
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    #[error("File system error during {operation} on '{}': {source}", .path.display())]
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Settings file could not be parsed
    #[error("Failed to parse settings '{}': {source}", .path.display())]
    Settings {
        /// Path to the settings file
        path: PathBuf,
        /// Underlying TOML error
        source: toml::de::Error,
    },

    /// Report serialization failed
    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Numerical computation produced invalid result
    #[error("Computation error in {operation}: {reason}")]
    Computation {
        /// Name of the computation that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },
}

/// Convenience type alias for analysis results
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Attaches the path and operation to I/O failures
pub trait WithPath<T> {
    /// Convert an I/O error into a [`AnalysisError::FileSystem`]
    ///
    /// # Errors
    ///
    /// Propagates the original error with the path and operation applied
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T>;
}

impl<T> WithPath<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T> {
        self.map_err(|source| AnalysisError::FileSystem {
            path: path.to_path_buf(),
            operation,
            source,
        })
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> AnalysisError {
    AnalysisError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a computation error
pub fn computation_error(operation: &'static str, reason: &impl ToString) -> AnalysisError {
    AnalysisError::Computation {
        operation,
        reason: reason.to_string(),
    }
}

/// Create an invalid source data error
pub fn invalid_source(reason: &impl ToString) -> AnalysisError {
    AnalysisError::InvalidSourceData {
        reason: reason.to_string(),
    }
}
