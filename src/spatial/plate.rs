//! Spot numbering and coordinates on a 5x5 SETL plate
//!
//! Spots are numbered row-major from the top-left corner:
//!
//! ```text
//!  1  2  3  4  5
//!  6  7  8  9 10
//! 11 12 13 14 15
//! 16 17 18 19 20
//! 21 22 23 24 25
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::io::error::{AnalysisError, Result};

/// Number of spots along one side of a plate
pub const PLATE_SIDE: usize = 5;

/// Total number of spots on a plate
pub const SPOT_COUNT: usize = PLATE_SIDE * PLATE_SIDE;

/// A single spot on a SETL plate, numbered 1 to 25
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Spot(u8);

/// Horizontal and vertical offset between two spots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PositionDifference {
    /// Absolute column difference
    pub horizontal: usize,
    /// Absolute row difference
    pub vertical: usize,
}

impl Spot {
    /// Create a spot from its number
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidSpot`] unless `number` is in 1..=25
    pub fn new(number: usize) -> Result<Self> {
        if (1..=SPOT_COUNT).contains(&number) {
            Ok(Self(number as u8))
        } else {
            Err(AnalysisError::InvalidSpot { number })
        }
    }

    /// Create a spot from its zero-based index, `None` past the last spot
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < SPOT_COUNT {
            Some(Self(index as u8 + 1))
        } else {
            None
        }
    }

    /// Spot number in 1..=25
    pub const fn number(self) -> usize {
        self.0 as usize
    }

    /// Zero-based index in 0..25
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// One-based `(row, col)` coordinate of the spot
    pub const fn coordinate(self) -> (usize, usize) {
        let index = self.index();
        (index / PLATE_SIDE + 1, index % PLATE_SIDE + 1)
    }

    /// Offset between this spot and `other`
    ///
    /// Symmetric, and zero in both directions only for the same spot.
    pub const fn position_difference(self, other: Self) -> PositionDifference {
        let (row_a, col_a) = self.coordinate();
        let (row_b, col_b) = other.coordinate();
        PositionDifference {
            horizontal: col_a.abs_diff(col_b),
            vertical: row_a.abs_diff(row_b),
        }
    }

    /// Iterate over all 25 spots in numbering order
    pub fn all() -> impl Iterator<Item = Self> {
        (0..SPOT_COUNT).filter_map(Self::from_index)
    }
}

impl TryFrom<usize> for Spot {
    type Error = AnalysisError;

    fn try_from(number: usize) -> Result<Self> {
        Self::new(number)
    }
}

impl From<Spot> for usize {
    fn from(spot: Spot) -> Self {
        spot.number()
    }
}

impl fmt::Display for Spot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
