/// Attraction or repulsion between two species
pub mod attraction_inter;
/// Attraction or repulsion within one species
pub mod attraction_intra;
/// Batch runs over many species with a summary
pub mod batch;
/// Observed and expected count checks
pub mod consistency;
/// Analysis settings, requests and their executor
pub mod executor;
/// Test outcomes per group and repeat tallies
pub mod outcome;
/// Preference of a species for plate areas
pub mod spot_preference;
