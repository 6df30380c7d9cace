//! Loading the SETL CSV export and selecting records from it
//!
//! The export holds four semicolon-separated tables without a header row.
//! Only `records.csv` and `plates.csv` are required; localities and species
//! only provide names for reports.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};

use crate::io::configuration::{
    CSV_DELIMITER, CSV_QUOTE, LOCALITIES_FILE, PLATES_FILE, RECORD_FIRST_SPOT_COLUMN,
    RECORD_MIN_COLUMNS, RECORD_PLATE_COLUMN, RECORD_SPECIES_COLUMN, RECORDS_FILE, SPECIES_FILE,
};
use crate::io::error::{AnalysisError, Result};
use crate::spatial::plate::SPOT_COUNT;
use crate::spatial::record::{PlateRecord, SpotSet, combine_records};

/// A sampling location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Locality {
    /// Locality id
    pub id: u32,
    /// Locality name
    pub name: String,
}

/// A species that can be recorded on plates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Species {
    /// Species id
    pub id: u32,
    /// Common name
    pub name_venacular: String,
    /// Scientific name
    pub name_latin: String,
}

impl Species {
    /// Name used in reports, the latin name when known
    pub fn display_name(&self) -> String {
        if self.name_latin.is_empty() {
            self.name_venacular.clone()
        } else {
            self.name_latin.clone()
        }
    }
}

/// A SETL plate deployed at a locality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Plate {
    /// Plate id
    pub id: u32,
    /// Locality the plate was deployed at
    pub locality_id: u32,
}

/// Presence of one species on one plate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesRecord {
    /// Plate the species was recorded on
    pub plate_id: u32,
    /// Recorded species
    pub species_id: u32,
    /// Spots the species was found on
    pub spots: SpotSet,
}

/// Localities and species an analysis is restricted to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Selected locality ids, empty for all localities
    pub locations: Vec<u32>,
    /// Selected species ids, treated as one species
    pub species: Vec<u32>,
}

impl Selection {
    /// Create a selection
    pub const fn new(locations: Vec<u32>, species: Vec<u32>) -> Self {
        Self { locations, species }
    }

    /// The same locations with a different species selection
    pub fn with_species(&self, species: Vec<u32>) -> Self {
        Self {
            locations: self.locations.clone(),
            species,
        }
    }
}

/// All tables of a SETL export
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    localities: Vec<Locality>,
    species: Vec<Species>,
    plates: HashMap<u32, Plate>,
    records: Vec<SpeciesRecord>,
}

impl Dataset {
    /// Build a dataset from already parsed tables
    pub fn from_parts(
        localities: Vec<Locality>,
        species: Vec<Species>,
        plates: Vec<Plate>,
        records: Vec<SpeciesRecord>,
    ) -> Self {
        Self {
            localities,
            species,
            plates: plates.into_iter().map(|plate| (plate.id, plate)).collect(),
            records,
        }
    }

    /// Load the export from a directory
    ///
    /// # Errors
    ///
    /// Returns an error if a required file is missing or any row can't be
    /// parsed
    pub fn load(dir: &Path) -> Result<Self> {
        let plates = read_table(&dir.join(PLATES_FILE), parse_plate)?;
        let records = read_table(&dir.join(RECORDS_FILE), parse_record)?;

        let localities_path = dir.join(LOCALITIES_FILE);
        let localities = if localities_path.is_file() {
            read_table(&localities_path, parse_locality)?
        } else {
            Vec::new()
        };
        let species_path = dir.join(SPECIES_FILE);
        let species = if species_path.is_file() {
            read_table(&species_path, parse_species)?
        } else {
            Vec::new()
        };

        let dataset = Self::from_parts(localities, species, plates, records);
        let orphans = dataset
            .records
            .iter()
            .filter(|record| !dataset.plates.contains_key(&record.plate_id))
            .count();
        if orphans > 0 {
            tracing::warn!(orphans, "Records refer to plates missing from {PLATES_FILE}");
        }
        tracing::info!(
            localities = dataset.localities.len(),
            species = dataset.species.len(),
            plates = dataset.plates.len(),
            records = dataset.records.len(),
            "Loaded SETL data from {}",
            dir.display()
        );
        Ok(dataset)
    }

    /// All localities
    pub fn localities(&self) -> &[Locality] {
        &self.localities
    }

    /// All species
    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// All species records
    pub fn records(&self) -> &[SpeciesRecord] {
        &self.records
    }

    /// Report name of a species, falling back to its id
    pub fn species_name(&self, id: u32) -> String {
        self.species
            .iter()
            .find(|species| species.id == id)
            .map_or_else(|| format!("species {id}"), Species::display_name)
    }

    /// Report name of a locality, falling back to its id
    pub fn locality_name(&self, id: u32) -> String {
        self.localities
            .iter()
            .find(|locality| locality.id == id)
            .map_or_else(|| format!("locality {id}"), |locality| locality.name.clone())
    }

    /// Ids of all species recorded at the selected locations
    pub fn species_at(&self, locations: &[u32]) -> Vec<u32> {
        let ids: BTreeSet<u32> = self
            .records
            .iter()
            .filter(|record| self.in_locations(record.plate_id, locations))
            .map(|record| record.species_id)
            .collect();
        ids.into_iter().collect()
    }

    /// Records matching a selection, one per plate, in plate id order
    ///
    /// Records of different selected species on the same plate are merged.
    ///
    /// # Errors
    ///
    /// Returns an error if no species is selected
    pub fn plate_records(&self, selection: &Selection) -> Result<Vec<PlateRecord>> {
        if selection.species.is_empty() {
            return Err(AnalysisError::EmptySelection {
                reason: "no species selected".to_string(),
            });
        }

        let mut by_plate: BTreeMap<u32, Vec<PlateRecord>> = BTreeMap::new();
        for record in &self.records {
            if selection.species.contains(&record.species_id)
                && self.in_locations(record.plate_id, &selection.locations)
            {
                by_plate
                    .entry(record.plate_id)
                    .or_default()
                    .push(PlateRecord::new(record.plate_id, record.spots.clone()));
            }
        }

        let merged = by_plate
            .values()
            .map(|records| combine_records(records))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(
            plates = merged.len(),
            species = ?selection.species,
            "Selected records merged per plate"
        );
        Ok(merged)
    }

    fn in_locations(&self, plate_id: u32, locations: &[u32]) -> bool {
        locations.is_empty()
            || self
                .plates
                .get(&plate_id)
                .is_some_and(|plate| locations.contains(&plate.locality_id))
    }
}

fn read_table<T>(
    path: &Path,
    parse: impl Fn(&StringRecord) -> std::result::Result<T, String>,
) -> Result<Vec<T>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .quote(CSV_QUOTE)
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| data_load(path, source))?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|source| data_load(path, source))?;
        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let line = row.position().map_or(0, csv::Position::line);
        let parsed = parse(&row).map_err(|reason| AnalysisError::MalformedRow {
            path: path.to_path_buf(),
            line,
            reason,
        })?;
        rows.push(parsed);
    }
    Ok(rows)
}

fn data_load(path: &Path, source: csv::Error) -> AnalysisError {
    AnalysisError::DataLoad {
        path: PathBuf::from(path),
        source,
    }
}

fn field<'r>(row: &'r StringRecord, column: usize, name: &str) -> std::result::Result<&'r str, String> {
    row.get(column)
        .map(str::trim)
        .ok_or_else(|| format!("missing column {} ({name})", column + 1))
}

fn parse_id(row: &StringRecord, column: usize, name: &str) -> std::result::Result<u32, String> {
    let value = field(row, column, name)?;
    value
        .parse()
        .map_err(|err: std::num::ParseIntError| format!("{name} '{value}' is not a valid id: {err}"))
}

/// Interpret a spot flag of the export
///
/// Access writes `-1` for true; `1`/`0` and `true`/`false` are accepted too,
/// an empty field means absent.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "-1" | "true" => Some(true),
        "0" | "" | "false" => Some(false),
        _ => None,
    }
}

fn parse_locality(row: &StringRecord) -> std::result::Result<Locality, String> {
    Ok(Locality {
        id: parse_id(row, 0, "loc_id")?,
        name: field(row, 1, "loc_name")?.to_string(),
    })
}

fn parse_species(row: &StringRecord) -> std::result::Result<Species, String> {
    Ok(Species {
        id: parse_id(row, 0, "spe_id")?,
        name_venacular: field(row, 1, "spe_name_venacular")?.to_string(),
        name_latin: field(row, 2, "spe_name_latin")?.to_string(),
    })
}

fn parse_plate(row: &StringRecord) -> std::result::Result<Plate, String> {
    Ok(Plate {
        id: parse_id(row, 0, "pla_id")?,
        locality_id: parse_id(row, 1, "pla_loc_id")?,
    })
}

fn parse_record(row: &StringRecord) -> std::result::Result<SpeciesRecord, String> {
    if row.len() < RECORD_MIN_COLUMNS {
        return Err(format!(
            "expected at least {RECORD_MIN_COLUMNS} columns, found {}",
            row.len()
        ));
    }

    let flags = (0..SPOT_COUNT)
        .map(|i| {
            let column = RECORD_FIRST_SPOT_COLUMN + i;
            let value = field(row, column, "spot flag")?;
            parse_flag(value).ok_or_else(|| format!("invalid flag '{value}' for spot {}", i + 1))
        })
        .collect::<std::result::Result<Vec<bool>, String>>()?;
    let spots = SpotSet::from_flags(&flags).map_err(|err| err.to_string())?;

    Ok(SpeciesRecord {
        plate_id: parse_id(row, RECORD_PLATE_COLUMN, "rec_pla_id")?,
        species_id: parse_id(row, RECORD_SPECIES_COLUMN, "rec_spe_id")?,
        spots,
    })
}
