/// Command-line interface and command runner
pub mod cli;
/// Constants and runtime settings
pub mod configuration;
/// SETL CSV export loading and species selection
pub mod dataset;
/// Error types
pub mod error;
/// Heat-map export
pub mod image;
/// Tracing setup
pub mod logging;
/// Progress bars
pub mod progress;
/// Report rendering and saving
pub mod report;
