//! PNG heat map of spot occupancy on a plate

use std::path::{Path, PathBuf};

use image::{ImageBuffer, Rgb};

use crate::io::configuration::HEATMAP_SPOT_PIXELS;
use crate::io::error::{AnalysisError, Result, WithPath, invalid_source};
use crate::spatial::plate::{PLATE_SIDE, SPOT_COUNT, Spot};
use crate::spatial::record::PlateRecord;

const EMPTY_COLOR: [u8; 3] = [255, 255, 255];
const FULL_COLOR: [u8; 3] = [8, 48, 107];
const GRID_COLOR: [u8; 3] = [160, 160, 160];

/// Number of plates with a positive value per spot, in spot order
pub fn spot_occupancy(records: &[PlateRecord]) -> [usize; SPOT_COUNT] {
    let mut occupancy = [0; SPOT_COUNT];
    for spot in records.iter().flat_map(|record| record.spots.spots()) {
        if let Some(count) = occupancy.get_mut(spot.index()) {
            *count += 1;
        }
    }
    occupancy
}

/// Heat map path of every selection
///
/// One selection keeps `path`, more selections get numbered file names such
/// as `map_1.png` and `map_2.png`.
pub fn heatmap_paths(path: &Path, selections: usize) -> Vec<PathBuf> {
    if selections <= 1 {
        return vec![path.to_path_buf()];
    }
    let stem = path
        .file_stem()
        .map_or_else(|| "heatmap".to_string(), |stem| stem.to_string_lossy().into_owned());
    let extension = path.extension().map(|ext| ext.to_string_lossy().into_owned());
    (1..=selections)
        .map(|n| {
            let name = match &extension {
                Some(ext) => format!("{stem}_{n}.{ext}"),
                None => format!("{stem}_{n}"),
            };
            path.with_file_name(name)
        })
        .collect()
}

// Linear blend from the empty to the full color
fn blend(fraction: f64) -> Rgb<u8> {
    let fraction = fraction.clamp(0.0, 1.0);
    let mut color = [0; 3];
    for ((channel, &empty), &full) in color.iter_mut().zip(&EMPTY_COLOR).zip(&FULL_COLOR) {
        let value = f64::from(empty) + (f64::from(full) - f64::from(empty)) * fraction;
        *channel = value.round() as u8;
    }
    Rgb(color)
}

/// Export the occupancy of each spot as a 5x5 heat map
///
/// Spots shade from white (never positive) to dark blue (most often
/// positive), separated by grey grid lines.
///
/// # Errors
///
/// Returns an error if:
/// - No spot is occupied
/// - The parent directory cannot be created
/// - The image cannot be saved to the specified path
pub fn export_heatmap(occupancy: &[usize; SPOT_COUNT], output_path: &Path) -> Result<()> {
    let max = occupancy.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return Err(invalid_source(&"no positive spots to draw"));
    }

    let side = PLATE_SIDE as u32 * HEATMAP_SPOT_PIXELS;
    let img = ImageBuffer::from_fn(side, side, |x, y| {
        if x % HEATMAP_SPOT_PIXELS == 0 || y % HEATMAP_SPOT_PIXELS == 0 {
            return Rgb(GRID_COLOR);
        }
        let index = (y / HEATMAP_SPOT_PIXELS) as usize * PLATE_SIDE
            + (x / HEATMAP_SPOT_PIXELS) as usize;
        let count = Spot::from_index(index)
            .and_then(|spot| occupancy.get(spot.index()))
            .copied()
            .unwrap_or(0);
        blend(count as f64 / max as f64)
    });

    if let Some(parent) = output_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent).with_path(parent, "create directory")?;
    }

    img.save(output_path)
        .map_err(|source| AnalysisError::ImageExport {
            path: output_path.to_path_buf(),
            source,
        })?;
    tracing::info!(path = %output_path.display(), "Heat map exported");
    Ok(())
}
