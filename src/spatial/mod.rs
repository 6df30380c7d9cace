//! Plate geometry and species records
//!
//! This module contains spatial-related functionality including:
//! - Spot numbering and coordinates on a SETL plate
//! - Fixed and user-defined plate areas
//! - Presence records per plate
//! - Spot pairs, random layouts and distances

/// Fixed plate areas and user area definitions
pub mod area;
/// Spot pairs and random spot layouts
pub mod combinations;
/// Spot distances and their distribution on a plate
pub mod distance;
/// Spot numbering and coordinates
pub mod plate;
/// Presence records of a species on a plate
pub mod record;

pub use plate::Spot;
pub use record::{PlateRecord, SpotSet};
