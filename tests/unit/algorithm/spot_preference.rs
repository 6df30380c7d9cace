//! Tests for the spot preference analysis

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use setlyze::AnalysisError;
    use setlyze::algorithm::executor::AnalysisSettings;
    use setlyze::algorithm::spot_preference::{AREA_GROUPS, group_label, run};
    use setlyze::spatial::area::AreaDefinition;
    use setlyze::spatial::plate::Spot;
    use setlyze::spatial::record::{PlateRecord, SpotSet};

    fn record(plate_id: u32, numbers: &[usize]) -> PlateRecord {
        let spots: SpotSet = numbers
            .iter()
            .map(|&n| Spot::new(n).expect("valid spot"))
            .collect();
        PlateRecord::new(plate_id, spots)
    }

    fn settings(repeats: usize) -> AnalysisSettings {
        AnalysisSettings {
            repeats,
            ..AnalysisSettings::default()
        }
    }

    // Tests the area group labels in test order
    #[test]
    fn test_group_labels() {
        let labels: Vec<String> = AREA_GROUPS.iter().map(|g| group_label(g)).collect();
        assert_eq!(
            labels,
            vec!["A", "B", "C", "D", "A+B", "C+D", "A+B+C", "B+C+D"]
        );
    }

    // Tests totals, Wilcoxon groups and repeats for corner-only records
    // Verified by counting expected totals from the observed spots
    #[test]
    fn test_corner_records() {
        let records: Vec<PlateRecord> = (1..=30).map(|id| record(id, &[1, 5, 21, 25])).collect();
        let mut rng = StdRng::seed_from_u64(11);
        let mut repeats_seen = 0;
        let result = run(
            &records,
            &AreaDefinition::default(),
            &settings(5),
            &mut rng,
            &mut |_| repeats_seen += 1,
        )
        .expect("species present");

        assert_eq!(repeats_seen, 5);
        assert_eq!(result.n_plates, 30);
        assert_eq!(result.wilcoxon.len(), AREA_GROUPS.len());
        assert_eq!(result.repeats.repeats, 5);
        assert_eq!(result.repeats.groups.len(), AREA_GROUPS.len());

        let observed: Vec<usize> = result.area_totals.iter().map(|t| t.observed).collect();
        assert_eq!(observed, vec![120, 0, 0, 0]);

        let area_a = result
            .wilcoxon
            .iter()
            .find(|o| o.summary.group == "A")
            .expect("group A tested");
        assert!((area_a.summary.mean_observed - 4.0).abs() < 1e-12);
        assert!(area_a.summary.mean_expected < 4.0);
        assert!(area_a.remarks.starts_with("Significant; Preference"));
    }

    // Tests the chi-squared test on user areas reports expected totals
    #[test]
    fn test_user_area_chi_squared() {
        let records: Vec<PlateRecord> = (1..=20)
            .map(|id| record(id, &[1, 2, 3, 7, 13, 25]))
            .collect();
        let areas: AreaDefinition = "A+B,C+D".parse().expect("valid areas");
        let mut rng = StdRng::seed_from_u64(3);
        let result = run(&records, &areas, &settings(2), &mut rng, &mut |_| {})
            .expect("species present");

        assert_eq!(result.area_totals.len(), 2);
        assert_eq!(result.area_totals[0].observed, 80);
        assert_eq!(result.area_totals[1].observed, 40);
        let chi = result.chi_squared.expect("expected counts large enough");
        assert_eq!(chi.test.df, 1);
        // 120 spots, 16/25 of them expected in A+B
        assert!((chi.test.expected[0] - 76.8).abs() < 1e-9);
        assert_eq!(result.area_totals[0].expected, Some(chi.test.expected[0]));
    }

    // Tests records without positive spots end the analysis
    #[test]
    fn test_species_not_found() {
        let records = vec![record(1, &[]), record(2, &[])];
        let mut rng = StdRng::seed_from_u64(1);
        let result = run(
            &records,
            &AreaDefinition::default(),
            &settings(1),
            &mut rng,
            &mut |_| {},
        );
        assert!(matches!(result, Err(AnalysisError::EmptySelection { .. })));
    }
}
