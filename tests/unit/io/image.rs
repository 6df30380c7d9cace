//! Tests for spot occupancy counts and the PNG heat map export

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use setlyze::AnalysisError;
    use setlyze::io::configuration::HEATMAP_SPOT_PIXELS;
    use setlyze::io::image::{export_heatmap, heatmap_paths, spot_occupancy};
    use setlyze::spatial::plate::Spot;
    use setlyze::spatial::record::{PlateRecord, SpotSet};
    use tempfile::TempDir;

    fn record(plate_id: u32, numbers: &[usize]) -> PlateRecord {
        let spots: SpotSet = numbers
            .iter()
            .map(|&n| Spot::new(n).expect("valid spot"))
            .collect();
        PlateRecord::new(plate_id, spots)
    }

    // Tests occupancy counts plates per spot
    #[test]
    fn test_spot_occupancy() {
        let occupancy = spot_occupancy(&[record(1, &[1, 13]), record(2, &[13, 25])]);
        assert_eq!(occupancy.first(), Some(&1));
        assert_eq!(occupancy.get(12), Some(&2));
        assert_eq!(occupancy.last(), Some(&1));
        assert_eq!(occupancy.iter().sum::<usize>(), 4);
    }

    // Tests the heat map file holds the plate at the expected size and shades
    // Verified by disabling file save operation
    #[test]
    fn test_export_heatmap_creates_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("maps").join("heatmap.png");
        let occupancy = spot_occupancy(&[record(1, &[1, 13]), record(2, &[13])]);
        export_heatmap(&occupancy, &path).expect("export succeeds");
        assert!(path.exists());

        let img = image::open(&path).expect("readable png").to_rgb8();
        let side = 5 * HEATMAP_SPOT_PIXELS;
        assert_eq!(img.dimensions(), (side, side));

        let centre = HEATMAP_SPOT_PIXELS / 2;
        let most = img.get_pixel(2 * HEATMAP_SPOT_PIXELS + centre, 2 * HEATMAP_SPOT_PIXELS + centre);
        let half = img.get_pixel(centre, centre);
        let empty = img.get_pixel(4 * HEATMAP_SPOT_PIXELS + centre, centre);
        assert_eq!(most.0, [8, 48, 107]);
        assert_eq!(empty.0, [255, 255, 255]);
        assert!(half.0[0] < empty.0[0] && half.0[0] > most.0[0]);
        assert_eq!(img.get_pixel(0, centre).0, [160, 160, 160]);
    }

    // Tests an empty plate can't be drawn
    #[test]
    fn test_export_heatmap_empty() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("empty.png");
        assert!(matches!(
            export_heatmap(&[0; 25], &path),
            Err(AnalysisError::InvalidSourceData { .. })
        ));
        assert!(!path.exists());
    }

    // Tests one selection keeps the path and two selections get numbered files
    #[test]
    fn test_heatmap_paths() {
        let path = Path::new("out/map.png");
        assert_eq!(heatmap_paths(path, 1), vec![PathBuf::from("out/map.png")]);
        assert_eq!(
            heatmap_paths(path, 2),
            vec![PathBuf::from("out/map_1.png"), PathBuf::from("out/map_2.png")]
        );
        assert_eq!(
            heatmap_paths(Path::new("map"), 2),
            vec![PathBuf::from("map_1"), PathBuf::from("map_2")]
        );
    }
}
