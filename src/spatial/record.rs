//! Presence/absence records of a species on a plate

use bitvec::prelude::*;
use serde::Serialize;

use crate::io::error::{Result, invalid_source};
use crate::spatial::plate::{SPOT_COUNT, Spot};

/// Set of positive spots on one plate
///
/// Backed by a 25-bit vector, bit `i` holds spot `i + 1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpotSet {
    bits: BitVec,
}

impl Default for SpotSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SpotSet {
    /// Create a set with no positive spots
    pub fn new() -> Self {
        Self {
            bits: bitvec![0; SPOT_COUNT],
        }
    }

    /// Create a set from 25 presence flags in spot order
    ///
    /// # Errors
    ///
    /// Returns an error when `flags` doesn't hold exactly 25 values
    pub fn from_flags(flags: &[bool]) -> Result<Self> {
        if flags.len() != SPOT_COUNT {
            return Err(invalid_source(&format!(
                "a record needs {SPOT_COUNT} spot flags, got {}",
                flags.len()
            )));
        }
        let mut set = Self::new();
        for (index, _) in flags.iter().enumerate().filter(|&(_, &flag)| flag) {
            set.bits.set(index, true);
        }
        Ok(set)
    }

    /// Create a set from spots
    pub fn from_spots(spots: impl IntoIterator<Item = Spot>) -> Self {
        let mut set = Self::new();
        for spot in spots {
            set.insert(spot);
        }
        set
    }

    /// Mark a spot as positive
    pub fn insert(&mut self, spot: Spot) {
        self.bits.set(spot.index(), true);
    }

    /// Test whether a spot is positive
    pub fn contains(&self, spot: Spot) -> bool {
        self.bits.get(spot.index()).as_deref() == Some(&true)
    }

    /// Number of positive spots
    pub fn len(&self) -> usize {
        self.bits.count_ones()
    }

    /// Check if no spot is positive
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Add every positive spot of `other` to this set
    pub fn union_with(&mut self, other: &Self) {
        for index in other.bits.iter_ones() {
            self.bits.set(index, true);
        }
    }

    /// Positive spots in ascending spot number
    pub fn spots(&self) -> impl Iterator<Item = Spot> + '_ {
        self.bits.iter_ones().filter_map(Spot::from_index)
    }

    /// Positive spot numbers in ascending order
    pub fn spot_numbers(&self) -> Vec<usize> {
        self.spots().map(Spot::number).collect()
    }
}

impl FromIterator<Spot> for SpotSet {
    fn from_iter<I: IntoIterator<Item = Spot>>(iter: I) -> Self {
        Self::from_spots(iter)
    }
}

impl Serialize for SpotSet {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.spot_numbers())
    }
}

/// Positive spots of one species selection on one plate
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlateRecord {
    /// Plate identifier
    pub plate_id: u32,
    /// Positive spots on the plate
    pub spots: SpotSet,
}

impl PlateRecord {
    /// Create a record for a plate
    pub const fn new(plate_id: u32, spots: SpotSet) -> Self {
        Self { plate_id, spots }
    }

    /// Number of positive spots
    pub fn positive_count(&self) -> usize {
        self.spots.len()
    }
}

/// Merge records found on the same plate into one record
///
/// A spot is positive in the result when it's positive in any record, so
/// several selected species are treated as one.
///
/// # Errors
///
/// Returns an error if `records` is empty or the plate ids differ
pub fn combine_records(records: &[PlateRecord]) -> Result<PlateRecord> {
    let Some(first) = records.first() else {
        return Err(invalid_source(&"no records to combine"));
    };

    let mut combined = PlateRecord::new(first.plate_id, SpotSet::new());
    for record in records {
        if record.plate_id != combined.plate_id {
            return Err(invalid_source(&format!(
                "cannot combine records of plate {} with plate {}",
                record.plate_id, combined.plate_id
            )));
        }
        combined.spots.union_with(&record.spots);
    }
    Ok(combined)
}
