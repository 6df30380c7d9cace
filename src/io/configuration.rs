//! Analysis constants and runtime settings
//!
//! Settings come from an optional TOML file, for example:
//!
//! ```toml
//! alpha_level = 0.01
//! repeats = 100
//! seed = 7
//! data_dir = "data"
//! areas = "A+B,C,D"
//! ```
//!
//! Command-line flags override values from the file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::io::error::{AnalysisError, Result, WithPath, invalid_parameter};

// Statistical defaults
/// Alpha level below which a p-value is significant
pub const DEFAULT_ALPHA_LEVEL: f64 = 0.05;
/// Alpha level of the Shapiro-Wilk test that picks the t-test or Wilcoxon
pub const DEFAULT_NORMALITY_ALPHA: f64 = 0.05;
/// Number of times tests on random expectations are repeated
pub const DEFAULT_REPEATS: usize = 20;
/// Fixed seed for reproducible expectations
pub const DEFAULT_SEED: u64 = 42;

// Limit so a typo doesn't start a run of hours
/// Maximum allowed number of repeats
pub const MAX_REPEATS: usize = 100_000;

// SETL CSV export layout
/// Field delimiter of the CSV export
pub const CSV_DELIMITER: u8 = b';';
/// Quote character of the CSV export
pub const CSV_QUOTE: u8 = b'"';
/// File name of the localities table
pub const LOCALITIES_FILE: &str = "localities.csv";
/// File name of the species table
pub const SPECIES_FILE: &str = "species.csv";
/// File name of the plates table
pub const PLATES_FILE: &str = "plates.csv";
/// File name of the records table
pub const RECORDS_FILE: &str = "records.csv";
/// Column holding the plate id in the records table
pub const RECORD_PLATE_COLUMN: usize = 1;
/// Column holding the species id in the records table
pub const RECORD_SPECIES_COLUMN: usize = 2;
/// Column holding the first spot flag (`sur1`) in the records table
pub const RECORD_FIRST_SPOT_COLUMN: usize = 10;
/// Minimum number of columns in the records table
pub const RECORD_MIN_COLUMNS: usize = 35;

// Output settings
/// Default settings file looked up in the working directory
pub const SETTINGS_FILE: &str = "setlyze.toml";
/// Suffix of saved JSON reports
pub const REPORT_EXTENSION: &str = "json";
/// File name of the batch summary report
pub const BATCH_SUMMARY_FILE: &str = "summary.json";
/// Pixels per spot side in heat-map images
pub const HEATMAP_SPOT_PIXELS: u32 = 40;

// Progress bar display settings
/// Threshold for switching to batch progress mode
pub const MAX_INDIVIDUAL_PROGRESS_BARS: usize = 5;

/// Runtime settings, every field optional in the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Alpha level for significance
    pub alpha_level: f64,
    /// Alpha level for the normality test
    pub normality_alpha: f64,
    /// Number of repeats with fresh random expectations
    pub repeats: usize,
    /// Seed of the random number generator
    pub seed: u64,
    /// Directory with the CSV export
    pub data_dir: Option<PathBuf>,
    /// Directory reports are saved to
    pub output_dir: Option<PathBuf>,
    /// User plate areas for the spot preference chi-squared test
    pub areas: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alpha_level: DEFAULT_ALPHA_LEVEL,
            normality_alpha: DEFAULT_NORMALITY_ALPHA,
            repeats: DEFAULT_REPEATS,
            seed: DEFAULT_SEED,
            data_dir: None,
            output_dir: None,
            areas: None,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read, isn't valid TOML, or
    /// holds invalid values
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_path(path, "read settings")?;
        let settings: Self = toml::from_str(&content).map_err(|source| AnalysisError::Settings {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from `path` if given, else from the default file if
    /// present, else the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but can't be loaded
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(SETTINGS_FILE);
                if default_path.is_file() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Check that every value is in range
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid value
    pub fn validate(&self) -> Result<()> {
        validate_alpha("alpha_level", self.alpha_level)?;
        validate_alpha("normality_alpha", self.normality_alpha)?;
        if self.repeats == 0 || self.repeats > MAX_REPEATS {
            return Err(invalid_parameter(
                "repeats",
                &self.repeats,
                &format!("must be between 1 and {MAX_REPEATS}"),
            ));
        }
        Ok(())
    }
}

fn validate_alpha(parameter: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(invalid_parameter(
            parameter,
            &value,
            &"must be between 0 and 1",
        ))
    }
}
