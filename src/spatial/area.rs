//! Plate areas used by the spot preference analysis
//!
//! The 25 spots split into four areas by their position:
//!
//! ```text
//! A B B B A
//! B C C C B
//! B C D C B
//! B C C C B
//! A B B B A
//! ```
//!
//! Users may merge these into at most four named areas of their own.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::io::error::{AnalysisError, Result, invalid_parameter};
use crate::spatial::plate::{PLATE_SIDE, SPOT_COUNT, Spot};

/// One of the four fixed plate areas
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PlateArea {
    /// The four corner spots
    A,
    /// Edge spots that aren't corners
    B,
    /// The ring around the centre
    C,
    /// The centre spot
    D,
}

impl PlateArea {
    /// All areas in order
    pub const ALL: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Area a spot belongs to
    pub const fn of(spot: Spot) -> Self {
        let (row, col) = spot.coordinate();
        let on_edge_row = row == 1 || row == PLATE_SIDE;
        let on_edge_col = col == 1 || col == PLATE_SIDE;
        let centre = PLATE_SIDE / 2 + 1;
        match (on_edge_row, on_edge_col) {
            (true, true) => Self::A,
            (true, false) | (false, true) => Self::B,
            (false, false) if row == centre && col == centre => Self::D,
            (false, false) => Self::C,
        }
    }

    /// Spots in this area
    pub fn spots(self) -> Vec<Spot> {
        Spot::all().filter(|&spot| Self::of(spot) == self).collect()
    }

    /// Position of this area in [`Self::ALL`]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Chance that a randomly placed spot falls in this area
    pub fn probability(self) -> f64 {
        self.spots().len() as f64 / SPOT_COUNT as f64
    }
}

impl fmt::Display for PlateArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        };
        f.write_str(letter)
    }
}

impl FromStr for PlateArea {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            _ => Err(invalid_parameter("plate area", &s, &"expected A, B, C or D")),
        }
    }
}

/// Number of positive spots per plate area
pub type AreaTotals = [usize; 4];

/// Count positive spots per area
pub fn area_totals(spots: impl IntoIterator<Item = Spot>) -> AreaTotals {
    let mut totals = [0; 4];
    for spot in spots {
        if let Some(total) = totals.get_mut(PlateArea::of(spot).index()) {
            *total += 1;
        }
    }
    totals
}

/// Sum of the totals of a group of areas
pub fn group_total(totals: &AreaTotals, group: &[PlateArea]) -> usize {
    group
        .iter()
        .filter_map(|area| totals.get(area.index()))
        .sum()
}

/// A user area made of one or more fixed areas
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserArea {
    /// Name shown in reports, `area1` to `area4`
    pub name: String,
    /// Fixed areas merged into this one
    pub areas: Vec<PlateArea>,
}

impl UserArea {
    /// Chance that a randomly placed spot falls in this area
    pub fn probability(&self) -> f64 {
        self.areas.iter().map(|area| area.probability()).sum()
    }

    /// Label such as `A+B`
    pub fn label(&self) -> String {
        self.areas
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("+")
    }
}

/// How the plate is split into user areas for the chi-squared test
///
/// Every fixed area belongs to exactly one user area, so the area
/// probabilities sum to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaDefinition {
    areas: Vec<UserArea>,
}

impl Default for AreaDefinition {
    fn default() -> Self {
        Self {
            areas: PlateArea::ALL
                .iter()
                .enumerate()
                .map(|(i, &area)| UserArea {
                    name: format!("area{}", i + 1),
                    areas: vec![area],
                })
                .collect(),
        }
    }
}

impl AreaDefinition {
    /// Build a definition from groups of fixed areas
    ///
    /// # Errors
    ///
    /// Returns an error if a group is empty, there are more than four
    /// groups, or the groups don't cover every fixed area exactly once
    pub fn new(groups: Vec<Vec<PlateArea>>) -> Result<Self> {
        if groups.is_empty() || groups.len() > PlateArea::ALL.len() {
            return Err(invalid_parameter(
                "areas",
                &groups.len(),
                &"expected one to four areas",
            ));
        }

        let mut seen = [0_usize; 4];
        for group in &groups {
            if group.is_empty() {
                return Err(invalid_parameter("areas", &"", &"an area can't be empty"));
            }
            for area in group {
                if let Some(count) = seen.get_mut(area.index()) {
                    *count += 1;
                }
            }
        }
        if let Some(area) = PlateArea::ALL
            .iter()
            .find(|area| seen.get(area.index()) != Some(&1))
        {
            return Err(invalid_parameter(
                "areas",
                area,
                &"every plate area must be used exactly once",
            ));
        }

        let areas = groups
            .into_iter()
            .enumerate()
            .map(|(i, mut areas)| {
                areas.sort_unstable();
                UserArea {
                    name: format!("area{}", i + 1),
                    areas,
                }
            })
            .collect();
        Ok(Self { areas })
    }

    /// User areas in order
    pub fn areas(&self) -> &[UserArea] {
        &self.areas
    }
}

impl FromStr for AreaDefinition {
    type Err = AnalysisError;

    /// Parse a definition such as `A+B,C,D`
    fn from_str(s: &str) -> Result<Self> {
        let groups = s
            .split(',')
            .map(|group| group.split('+').map(str::parse).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;
        Self::new(groups)
    }
}

impl fmt::Display for AreaDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.areas.iter().map(UserArea::label).collect();
        f.write_str(&labels.join(","))
    }
}
