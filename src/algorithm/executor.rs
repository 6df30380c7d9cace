//! Analysis settings, requests and the executor that runs them

use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;

use crate::algorithm::{attraction_inter, attraction_intra, spot_preference};
use crate::io::configuration::{
    DEFAULT_ALPHA_LEVEL, DEFAULT_NORMALITY_ALPHA, DEFAULT_REPEATS, DEFAULT_SEED, Settings,
};
use crate::io::dataset::{Dataset, Selection};
use crate::io::error::Result;
use crate::io::report::{AnalysisReport, SelectionReport};
use crate::spatial::area::AreaDefinition;

/// Statistical parameters shared by all analyses
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AnalysisSettings {
    /// Alpha level for significance
    pub alpha_level: f64,
    /// Alpha level of the normality test
    pub normality_alpha: f64,
    /// Number of repeats with fresh random expectations
    pub repeats: usize,
    /// Seed of the random number generator
    pub seed: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            alpha_level: DEFAULT_ALPHA_LEVEL,
            normality_alpha: DEFAULT_NORMALITY_ALPHA,
            repeats: DEFAULT_REPEATS,
            seed: DEFAULT_SEED,
        }
    }
}

impl AnalysisSettings {
    /// Take the statistical parameters from validated settings
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            alpha_level: settings.alpha_level,
            normality_alpha: settings.normality_alpha,
            repeats: settings.repeats,
            seed: settings.seed,
        })
    }

    /// Confidence level matching the alpha level
    pub fn conf_level(&self) -> f64 {
        1.0 - self.alpha_level
    }
}

/// The available analyses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Preference of a species for plate areas
    SpotPreference,
    /// Attraction or repulsion between individuals of one species
    AttractionIntra,
    /// Attraction or repulsion between two species
    AttractionInter,
}

impl AnalysisKind {
    /// Title shown in reports
    pub const fn title(self) -> &'static str {
        match self {
            Self::SpotPreference => "Spot Preference",
            Self::AttractionIntra => "Attraction within Species",
            Self::AttractionInter => "Attraction between Species",
        }
    }

    /// Short name used for file names
    pub const fn slug(self) -> &'static str {
        match self {
            Self::SpotPreference => "spot_preference",
            Self::AttractionIntra => "attraction_intra",
            Self::AttractionInter => "attraction_inter",
        }
    }
}

/// One analysis to run with its selections
#[derive(Clone, Debug, PartialEq)]
pub enum AnalysisRequest {
    /// Spot preference of a selection
    SpotPreference {
        /// Localities and species
        selection: Selection,
        /// User areas for the chi-squared test
        areas: AreaDefinition,
    },
    /// Intra-specific attraction of a selection
    AttractionIntra {
        /// Localities and species
        selection: Selection,
    },
    /// Inter-specific attraction between two selections
    AttractionInter {
        /// First species selection
        first: Selection,
        /// Second species selection
        second: Selection,
    },
}

impl AnalysisRequest {
    /// Which analysis this request runs
    pub const fn kind(&self) -> AnalysisKind {
        match self {
            Self::SpotPreference { .. } => AnalysisKind::SpotPreference,
            Self::AttractionIntra { .. } => AnalysisKind::AttractionIntra,
            Self::AttractionInter { .. } => AnalysisKind::AttractionInter,
        }
    }

    /// Selections of the request in order
    pub fn selections(&self) -> Vec<&Selection> {
        match self {
            Self::SpotPreference { selection, .. } | Self::AttractionIntra { selection } => {
                vec![selection]
            }
            Self::AttractionInter { first, second } => vec![first, second],
        }
    }

    /// Species names of the request, selections joined by ` / `
    pub fn label(&self, dataset: &Dataset) -> String {
        self.selections()
            .iter()
            .map(|selection| {
                selection
                    .species
                    .iter()
                    .map(|&id| dataset.species_name(id))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

/// Result of one analysis
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "analysis", rename_all = "snake_case")]
pub enum AnalysisResult {
    /// Spot preference result
    SpotPreference(spot_preference::SpotPreferenceResult),
    /// Intra-specific attraction result
    AttractionIntra(attraction_intra::IntraResult),
    /// Inter-specific attraction result
    AttractionInter(attraction_inter::InterResult),
}

impl AnalysisResult {
    /// Number of plates the analysis used
    pub const fn n_plates(&self) -> usize {
        match self {
            Self::SpotPreference(result) => result.n_plates,
            Self::AttractionIntra(result) => result.n_plates,
            Self::AttractionInter(result) => result.n_plates,
        }
    }
}

/// Runs analyses on a dataset with one seeded random number generator
///
/// Each run draws new random expectations, so running the same request
/// twice repeats the analysis with fresh expected values.
pub struct AnalysisExecutor<'a> {
    dataset: &'a Dataset,
    settings: AnalysisSettings,
    rng: StdRng,
}

impl<'a> AnalysisExecutor<'a> {
    /// Create an executor seeded from the settings
    pub fn new(dataset: &'a Dataset, settings: AnalysisSettings) -> Self {
        Self {
            dataset,
            settings,
            rng: StdRng::seed_from_u64(settings.seed),
        }
    }

    /// Settings used for every run
    pub const fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Dataset the executor reads from
    pub const fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Run one analysis, calling `on_repeat` after every repeat
    ///
    /// # Errors
    ///
    /// Returns an error if the selection is empty or a test fails
    pub fn run(
        &mut self,
        request: &AnalysisRequest,
        on_repeat: &mut dyn FnMut(usize),
    ) -> Result<AnalysisReport> {
        let kind = request.kind();
        tracing::info!(
            analysis = kind.title(),
            species = %request.label(self.dataset),
            repeats = self.settings.repeats,
            "Performing analysis"
        );

        let result = match request {
            AnalysisRequest::SpotPreference { selection, areas } => {
                let records = self.dataset.plate_records(selection)?;
                AnalysisResult::SpotPreference(spot_preference::run(
                    &records,
                    areas,
                    &self.settings,
                    &mut self.rng,
                    on_repeat,
                )?)
            }
            AnalysisRequest::AttractionIntra { selection } => {
                let records = self.dataset.plate_records(selection)?;
                AnalysisResult::AttractionIntra(attraction_intra::run(
                    &records,
                    &self.settings,
                    &mut self.rng,
                    on_repeat,
                )?)
            }
            AnalysisRequest::AttractionInter { first, second } => {
                let first_records = self.dataset.plate_records(first)?;
                let second_records = self.dataset.plate_records(second)?;
                AnalysisResult::AttractionInter(attraction_inter::run(
                    &first_records,
                    &second_records,
                    &self.settings,
                    &mut self.rng,
                    on_repeat,
                )?)
            }
        };

        tracing::info!(
            analysis = kind.title(),
            plates = result.n_plates(),
            "Analysis completed"
        );

        let selections = request
            .selections()
            .into_iter()
            .map(|selection| SelectionReport::describe(selection, self.dataset))
            .collect();
        Ok(AnalysisReport {
            analysis: kind,
            title: kind.title().to_string(),
            label: request.label(self.dataset),
            settings: self.settings,
            selections,
            result,
        })
    }
}
