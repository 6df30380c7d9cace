//! Command-line interface for running analyses on a SETL export

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::algorithm::batch::{BatchObserver, NoProgress, batch_requests, run_batch, summarize};
use crate::algorithm::executor::{
    AnalysisExecutor, AnalysisKind, AnalysisRequest, AnalysisSettings,
};
use crate::io::configuration::Settings;
use crate::io::dataset::{Dataset, Selection};
use crate::io::error::{Result, WithPath};
use crate::io::image::{export_heatmap, heatmap_paths, spot_occupancy};
use crate::io::progress::ProgressManager;
use crate::io::report::{render_summary, save_all};
use crate::spatial::area::AreaDefinition;
use crate::spatial::distance::{DistanceKind, distance_counts, distance_probabilities};

#[derive(Parser)]
#[command(name = "setlyze")]
#[command(
    author,
    version,
    about = "Analyse the spatial distribution of species on SETL plates"
)]
/// Command-line arguments shared by every analysis
pub struct Cli {
    /// Analysis to run
    #[command(subcommand)]
    pub command: Command,

    /// Directory with the CSV export (default: settings or current directory)
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Settings file (default: setlyze.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Alpha level for significance
    #[arg(short, long, global = true)]
    pub alpha: Option<f64>,

    /// Alpha level of the normality test
    #[arg(long, global = true)]
    pub normality_alpha: Option<f64>,

    /// Number of repeats with random expectations
    #[arg(short, long, global = true)]
    pub repeats: Option<usize>,

    /// Random seed for reproducible expectations
    #[arg(short, long, global = true)]
    pub seed: Option<u64>,

    /// More log output, repeat for debug messages
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress output and log messages below errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Localities and species of one selection
#[derive(Args, Clone, Debug)]
pub struct SelectionArgs {
    /// Species ids, several are treated as one species
    #[arg(long, value_delimiter = ',', required = true)]
    pub species: Vec<u32>,

    /// Locality ids (default: all localities)
    #[arg(long, value_delimiter = ',')]
    pub locations: Vec<u32>,
}

impl SelectionArgs {
    fn selection(&self) -> Selection {
        Selection::new(self.locations.clone(), self.species.clone())
    }
}

/// Output options of a single analysis
#[derive(Args, Clone, Debug)]
pub struct OutputArgs {
    /// Save the report as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Run the analysis this many times, each with fresh expectations
    #[arg(long, default_value_t = 1)]
    pub runs: usize,

    /// Export a heat map of the spot occupancy as PNG, numbered per species
    /// selection for inter-specific attraction
    #[arg(long)]
    pub heatmap: Option<PathBuf>,
}

/// Analysis selectable for batches
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchAnalysis {
    /// Spot preference
    Preference,
    /// Attraction within species
    Intra,
    /// Attraction between species
    Inter,
}

impl From<BatchAnalysis> for AnalysisKind {
    fn from(value: BatchAnalysis) -> Self {
        match value {
            BatchAnalysis::Preference => Self::SpotPreference,
            BatchAnalysis::Intra => Self::AttractionIntra,
            BatchAnalysis::Inter => Self::AttractionInter,
        }
    }
}

/// Distance layout for the distance table
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceArg {
    /// Pairs of distinct spots of one species
    Intra,
    /// Pairs of spots of two species
    Inter,
}

impl From<DistanceArg> for DistanceKind {
    fn from(value: DistanceArg) -> Self {
        match value {
            DistanceArg::Intra => Self::Intra,
            DistanceArg::Inter => Self::Inter,
        }
    }
}

/// Subcommands, one per analysis
#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Spot preference of a species for plate areas
    Preference {
        /// Selection to analyse
        #[command(flatten)]
        selection: SelectionArgs,
        /// User areas for the chi-squared test, such as `A+B,C,D`
        #[arg(long)]
        areas: Option<String>,
        /// Output options
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Attraction or repulsion between individuals of one species
    Intra {
        /// Selection to analyse
        #[command(flatten)]
        selection: SelectionArgs,
        /// Output options
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Attraction or repulsion between two species
    Inter {
        /// First selection
        #[command(flatten)]
        selection: SelectionArgs,
        /// Species ids of the second selection
        #[arg(long, value_delimiter = ',', required = true)]
        second_species: Vec<u32>,
        /// Locality ids of the second selection (default: as the first)
        #[arg(long, value_delimiter = ',')]
        second_locations: Option<Vec<u32>>,
        /// Output options
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run one analysis per species and summarise significant results
    Batch {
        /// Analysis to run
        #[arg(value_enum)]
        analysis: BatchAnalysis,
        /// Species ids (default: all species at the locations)
        #[arg(long, value_delimiter = ',')]
        species: Vec<u32>,
        /// Second species ids for inter-specific batches (default: all)
        #[arg(long, value_delimiter = ',')]
        second_species: Vec<u32>,
        /// Locality ids (default: all localities)
        #[arg(long, value_delimiter = ',')]
        locations: Vec<u32>,
        /// User areas for spot preference batches
        #[arg(long)]
        areas: Option<String>,
        /// Directory for all reports and the summary
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Print the possible spot distances and their probabilities
    Distances {
        /// Distance layout
        #[arg(value_enum, default_value = "intra")]
        kind: DistanceArg,
    },
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Settings from the settings file with command-line overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file can't be loaded or a value is
    /// out of range
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::discover(self.config.as_deref())?;
        if let Some(alpha) = self.alpha {
            settings.alpha_level = alpha;
        }
        if let Some(alpha) = self.normality_alpha {
            settings.normality_alpha = alpha;
        }
        if let Some(repeats) = self.repeats {
            settings.repeats = repeats;
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if let Some(ref dir) = self.data_dir {
            settings.data_dir = Some(dir.clone());
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn area_definition(cli_areas: Option<&str>, settings: &Settings) -> Result<AreaDefinition> {
    cli_areas
        .or(settings.areas.as_deref())
        .map_or_else(|| Ok(AreaDefinition::default()), str::parse)
}

/// Runs the selected subcommand and writes its output
pub struct CommandRunner {
    cli: Cli,
}

impl CommandRunner {
    /// Create a runner for parsed arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the command
    ///
    /// # Errors
    ///
    /// Returns an error if settings or data can't be loaded, an analysis
    /// fails, or output can't be written
    pub fn run(&self) -> Result<()> {
        if let Command::Distances { kind } = self.cli.command {
            return write_stdout(&distance_table(kind.into()));
        }

        let settings = self.cli.settings()?;
        let data_dir = settings
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let dataset = Dataset::load(&data_dir)?;
        let analysis_settings = AnalysisSettings::from_settings(&settings)?;
        let mut executor = AnalysisExecutor::new(&dataset, analysis_settings);

        match &self.cli.command {
            Command::Preference {
                selection,
                areas,
                output,
            } => {
                let request = AnalysisRequest::SpotPreference {
                    selection: selection.selection(),
                    areas: area_definition(areas.as_deref(), &settings)?,
                };
                self.run_single(&mut executor, &request, output)
            }
            Command::Intra { selection, output } => {
                let request = AnalysisRequest::AttractionIntra {
                    selection: selection.selection(),
                };
                self.run_single(&mut executor, &request, output)
            }
            Command::Inter {
                selection,
                second_species,
                second_locations,
                output,
            } => {
                let first = selection.selection();
                let locations = second_locations
                    .clone()
                    .unwrap_or_else(|| first.locations.clone());
                let request = AnalysisRequest::AttractionInter {
                    second: Selection::new(locations, second_species.clone()),
                    first,
                };
                self.run_single(&mut executor, &request, output)
            }
            Command::Batch {
                analysis,
                species,
                second_species,
                locations,
                areas,
                output_dir,
            } => {
                let all_species = || dataset.species_at(locations);
                let species = if species.is_empty() { all_species() } else { species.clone() };
                let second_species = if second_species.is_empty() {
                    all_species()
                } else {
                    second_species.clone()
                };
                let requests = batch_requests(
                    (*analysis).into(),
                    locations,
                    &species,
                    &second_species,
                    &area_definition(areas.as_deref(), &settings)?,
                )?;
                let output_dir = output_dir.clone().or_else(|| settings.output_dir.clone());
                self.run_batch(&mut executor, &requests, output_dir.as_deref())
            }
            Command::Distances { .. } => Ok(()),
        }
    }

    fn run_single(
        &self,
        executor: &mut AnalysisExecutor<'_>,
        request: &AnalysisRequest,
        output: &OutputArgs,
    ) -> Result<()> {
        let runs = output.runs.max(1);
        let repeats = executor.settings().repeats.max(1);
        let label = request.label(executor.dataset());
        let mut progress = self.cli.should_show_progress().then(ProgressManager::new);
        if let Some(ref mut pm) = progress {
            pm.initialize(runs);
        }

        let mut reports = Vec::with_capacity(runs);
        {
            let mut no_progress = NoProgress;
            let observer: &mut dyn BatchObserver = match progress.as_mut() {
                Some(pm) => pm,
                None => &mut no_progress,
            };
            for run in 0..runs {
                observer.job_started(run, &label, repeats);
                let report =
                    executor.run(request, &mut |repeat| observer.repeat_finished(run, repeat));
                observer.job_finished(run);
                reports.push(report?);
            }
        }
        if let Some(ref pm) = progress {
            pm.finish();
        }

        for report in &reports {
            write_stdout(&report.render())?;
        }
        let Some(report) = reports.last() else {
            return Ok(());
        };
        if let Some(ref path) = output.output {
            report.save_json(path)?;
        }
        if let Some(ref path) = output.heatmap {
            let selections = request.selections();
            for (selection, path) in selections.iter().zip(heatmap_paths(path, selections.len())) {
                let records = executor.dataset().plate_records(selection)?;
                export_heatmap(&spot_occupancy(&records), &path)?;
            }
        }
        Ok(())
    }

    fn run_batch(
        &self,
        executor: &mut AnalysisExecutor<'_>,
        requests: &[AnalysisRequest],
        output_dir: Option<&Path>,
    ) -> Result<()> {
        let outcome = if self.cli.should_show_progress() {
            let mut pm = ProgressManager::new();
            pm.initialize(requests.len());
            let outcome = run_batch(executor, requests, &mut pm);
            pm.finish();
            outcome?
        } else {
            run_batch(executor, requests, &mut NoProgress)?
        };

        let summary = summarize(&outcome, executor.settings().alpha_level);
        let title = requests
            .first()
            .map_or("Batch", |request| request.kind().title());
        write_stdout(&render_summary(title, &summary))?;

        if let Some(dir) = output_dir {
            save_all(&outcome, &summary, dir)?;
        }
        Ok(())
    }
}

fn distance_table(kind: DistanceKind) -> String {
    let counts = distance_counts(kind);
    let total: usize = counts.values().sum();
    let mut lines = vec![format!("distance  pairs  probability (of {total})")];
    for (key, probability) in distance_probabilities(kind) {
        let pairs = counts.get(&key).copied().unwrap_or(0);
        lines.push(format!("{:>8}  {pairs:>5}  {probability:.6}", key.to_string()));
    }
    lines.join("\n")
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}").with_path(Path::new("<stdout>"), "write output")
}
