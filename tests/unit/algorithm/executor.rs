//! Tests for analysis settings, requests and the executor

#[cfg(test)]
mod tests {
    use setlyze::AnalysisError;
    use setlyze::algorithm::executor::{
        AnalysisExecutor, AnalysisKind, AnalysisRequest, AnalysisResult, AnalysisSettings,
    };
    use setlyze::io::configuration::Settings;
    use setlyze::io::dataset::{Dataset, Locality, Plate, Selection, Species, SpeciesRecord};
    use setlyze::spatial::area::AreaDefinition;
    use setlyze::spatial::plate::Spot;
    use setlyze::spatial::record::SpotSet;

    fn spots(numbers: &[usize]) -> SpotSet {
        numbers
            .iter()
            .map(|&n| Spot::new(n).expect("valid spot"))
            .collect()
    }

    fn dataset() -> Dataset {
        let localities = vec![
            Locality {
                id: 1,
                name: "Haringvliet".to_string(),
            },
            Locality {
                id: 2,
                name: "Grevelingen".to_string(),
            },
        ];
        let species = vec![
            Species {
                id: 1,
                name_venacular: "Bay barnacle".to_string(),
                name_latin: "Balanus improvisus".to_string(),
            },
            Species {
                id: 2,
                name_venacular: "Sea vase".to_string(),
                name_latin: "Ciona intestinalis".to_string(),
            },
            Species {
                id: 3,
                name_venacular: "Absent".to_string(),
                name_latin: String::new(),
            },
        ];
        let plates: Vec<Plate> = (1..=40)
            .map(|id| Plate {
                id,
                locality_id: if id <= 30 { 1 } else { 2 },
            })
            .collect();
        let mut records = Vec::new();
        for plate_id in 1..=40 {
            records.push(SpeciesRecord {
                plate_id,
                species_id: 1,
                spots: spots(&[1, 2, 6, 7]),
            });
            records.push(SpeciesRecord {
                plate_id,
                species_id: 2,
                spots: spots(&[2, 13]),
            });
        }
        Dataset::from_parts(localities, species, plates, records)
    }

    fn settings(repeats: usize) -> AnalysisSettings {
        AnalysisSettings {
            repeats,
            ..AnalysisSettings::default()
        }
    }

    fn intra(species: Vec<u32>) -> AnalysisRequest {
        AnalysisRequest::AttractionIntra {
            selection: Selection::new(Vec::new(), species),
        }
    }

    // Tests default settings and the confidence level
    #[test]
    fn test_default_settings() {
        let defaults = AnalysisSettings::default();
        assert!((defaults.alpha_level - 0.05).abs() < f64::EPSILON);
        assert_eq!(defaults.repeats, 20);
        assert!((defaults.conf_level() - 0.95).abs() < 1e-12);

        let from_file = Settings {
            repeats: 7,
            seed: 3,
            ..Settings::default()
        };
        let converted = AnalysisSettings::from_settings(&from_file).expect("valid settings");
        assert_eq!((converted.repeats, converted.seed), (7, 3));

        let invalid = Settings {
            alpha_level: 1.5,
            ..Settings::default()
        };
        assert!(AnalysisSettings::from_settings(&invalid).is_err());
    }

    // Tests titles and file name slugs of the analyses
    #[test]
    fn test_analysis_kinds() {
        assert_eq!(AnalysisKind::SpotPreference.slug(), "spot_preference");
        assert_eq!(AnalysisKind::AttractionIntra.slug(), "attraction_intra");
        assert_eq!(AnalysisKind::AttractionInter.title(), "Attraction between Species");
    }

    // Tests request kinds, selections and species labels
    #[test]
    fn test_request_labels() {
        let data = dataset();
        let inter = AnalysisRequest::AttractionInter {
            first: Selection::new(vec![1], vec![1]),
            second: Selection::new(vec![1], vec![2, 3]),
        };
        assert_eq!(inter.kind(), AnalysisKind::AttractionInter);
        assert_eq!(inter.selections().len(), 2);
        assert_eq!(
            inter.label(&data),
            "Balanus improvisus / Ciona intestinalis, Absent"
        );

        let preference = AnalysisRequest::SpotPreference {
            selection: Selection::new(Vec::new(), vec![9]),
            areas: AreaDefinition::default(),
        };
        assert_eq!(preference.kind(), AnalysisKind::SpotPreference);
        assert_eq!(preference.label(&data), "species 9");
    }

    // Tests a run reports its selections, plate count and repeats
    #[test]
    fn test_run_intra() {
        let data = dataset();
        let mut executor = AnalysisExecutor::new(&data, settings(3));
        let mut repeats_seen = 0;
        let report = executor
            .run(&intra(vec![1]), &mut |_| repeats_seen += 1)
            .expect("plates found");

        assert_eq!(repeats_seen, 3);
        assert_eq!(report.analysis, AnalysisKind::AttractionIntra);
        assert_eq!(report.title, "Attraction within Species");
        assert_eq!(report.label, "Balanus improvisus");
        assert_eq!(report.result.n_plates(), 40);
        let selection = report.selections.first().expect("one selection");
        assert_eq!(selection.species, vec!["Balanus improvisus"]);
        assert!(selection.locations.is_empty());
        assert!(matches!(report.result, AnalysisResult::AttractionIntra(_)));
    }

    // Tests locality selections restrict the plates
    #[test]
    fn test_run_with_locations() {
        let data = dataset();
        let mut executor = AnalysisExecutor::new(&data, settings(1));
        let request = AnalysisRequest::SpotPreference {
            selection: Selection::new(vec![2], vec![1]),
            areas: AreaDefinition::default(),
        };
        let report = executor.run(&request, &mut |_| {}).expect("plates found");
        assert_eq!(report.result.n_plates(), 10);
        assert_eq!(
            report.selections.first().expect("one selection").locations,
            vec!["Grevelingen"]
        );
    }

    // Tests the same seed gives the same report
    #[test]
    fn test_seeded_runs_repeat() {
        let data = dataset();
        let request = AnalysisRequest::AttractionInter {
            first: Selection::new(Vec::new(), vec![1]),
            second: Selection::new(Vec::new(), vec![2]),
        };
        let first = AnalysisExecutor::new(&data, settings(2))
            .run(&request, &mut |_| {})
            .expect("shared plates");
        let second = AnalysisExecutor::new(&data, settings(2))
            .run(&request, &mut |_| {})
            .expect("shared plates");
        assert_eq!(first, second);
    }

    // Tests selections without usable plates fail with an empty selection
    #[test]
    fn test_empty_selections() {
        let data = dataset();
        let mut executor = AnalysisExecutor::new(&data, settings(1));
        assert!(matches!(
            executor.run(&intra(vec![3]), &mut |_| {}),
            Err(AnalysisError::EmptySelection { .. })
        ));
        assert!(matches!(
            executor.run(&intra(Vec::new()), &mut |_| {}),
            Err(AnalysisError::EmptySelection { .. })
        ));
    }
}
