//! Spatial distribution analysis of species settlement on SETL plates
//!
//! A SETL plate is a 5x5 grid of spots on which settling species are
//! recorded. The analyses compare the observed positions with positions
//! expected for random settlement: spot preference for plate areas, and
//! attraction or repulsion within one species or between two species.

#![forbid(unsafe_code)]

/// Analyses, repeats and batch runs
pub mod algorithm;
/// Statistical tests and their interpretation
pub mod analysis;
/// Data import, settings, reports and the command line
pub mod io;
/// Descriptive statistics and probability distributions
pub mod math;
/// Plates, spots, areas and spot distances
pub mod spatial;

pub use io::error::{AnalysisError, Result};
