//! Tests for the intra-specific attraction analysis

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use setlyze::AnalysisError;
    use setlyze::algorithm::attraction_intra::{
        MAX_PLATE_SPOTS, MIN_PLATE_SPOTS, combined_label, run,
    };
    use setlyze::algorithm::executor::AnalysisSettings;
    use setlyze::algorithm::outcome::LocationOutcome;
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

    fn fixture() -> Vec<PlateRecord> {
        let full: Vec<usize> = (1..=25).collect();
        vec![
            record(1, &[1, 2, 3]),
            record(2, &[1, 2, 3]),
            record(3, &[1, 2, 3]),
            record(4, &full),
            record(5, &[13]),
        ]
    }

    // Tests the label of the group of all tested plates
    #[test]
    fn test_combined_label() {
        assert_eq!(combined_label(), "2-24");
        assert_eq!((MIN_PLATE_SPOTS, MAX_PLATE_SPOTS), (2, 24));
    }

    // Tests plates with one spot are dropped and full plates stay out of the groups
    // Verified by putting full plates in the combined group
    #[test]
    fn test_groups_and_plate_counts() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut repeats_seen = Vec::new();
        let result = run(&fixture(), &settings(3), &mut rng, &mut |r| {
            repeats_seen.push(r);
        })
        .expect("plates with distances");

        assert_eq!(repeats_seen, vec![1, 2, 3]);
        assert_eq!(result.n_plates, 4);

        let groups: Vec<&str> = result
            .location
            .iter()
            .map(|outcome| outcome.summary().group.as_str())
            .collect();
        assert_eq!(groups, vec!["3", "2-24"]);
        for outcome in &result.location {
            assert_eq!(outcome.summary().n_plates, 3);
            assert_eq!(outcome.summary().n_values, 9);
            // Distances 1, 1 and 2 on every plate
            assert!((outcome.summary().mean_observed - 4.0 / 3.0).abs() < 1e-12);
        }
        assert_eq!(result.normality.len(), 2);
        assert_eq!(result.repeats.repeats, 3);
        assert_eq!(result.repeats.groups.len(), 2);
    }

    // Tests nine distances over fourteen classes are too few for chi-squared
    #[test]
    fn test_chi_squared_skipped_for_small_groups() {
        let mut rng = StdRng::seed_from_u64(8);
        let result = run(&fixture(), &settings(1), &mut rng, &mut |_| {}).expect("valid");
        assert!(result.chi_squared.is_empty());
    }

    // Tests many clustered plates give a significant attraction
    #[test]
    fn test_clustered_plates_attract() {
        let records: Vec<PlateRecord> = (1..=40).map(|id| record(id, &[1, 2, 6, 7])).collect();
        let mut rng = StdRng::seed_from_u64(21);
        let result = run(&records, &settings(4), &mut rng, &mut |_| {}).expect("valid");

        let combined = result
            .location
            .iter()
            .find(|outcome| outcome.summary().group == "2-24")
            .expect("combined group");
        assert!(combined.p_value() < 0.001);
        let remarks = match combined {
            LocationOutcome::TTest(outcome) => &outcome.remarks,
            LocationOutcome::Wilcoxon(outcome) => &outcome.remarks,
        };
        assert!(remarks.starts_with("Significant; Attraction"));

        let tally = result.repeats.get("4").expect("group 4 tallied");
        assert_eq!(tally.n_significant, 4);
    }

    // Tests bell-shaped distances pass Shapiro-Wilk and get the t-test
    // Verified by always running the Wilcoxon test
    #[test]
    fn test_normal_distances_use_t_test() {
        // Spot 1 paired with spots at distances 1, 2, 2.24, 2.83, 3, 3, 3.16, 3.61, 4 and 5
        let partners = [2, 3, 8, 13, 4, 4, 9, 14, 5, 20];
        let records: Vec<PlateRecord> = partners
            .iter()
            .zip(1..)
            .map(|(&spot, id)| record(id, &[1, spot]))
            .collect();
        let mut rng = StdRng::seed_from_u64(17);
        let result = run(&records, &settings(1), &mut rng, &mut |_| {}).expect("valid");

        assert_eq!(result.normality.len(), 2);
        for normality in &result.normality {
            let test = normality.test.expect("ten distinct enough values");
            assert!(test.p_value > 0.5, "p = {}", test.p_value);
            assert!(normality.normal);
        }
        assert_eq!(result.location.len(), 2);
        for outcome in &result.location {
            assert!(matches!(outcome, LocationOutcome::TTest(_)), "{outcome:?}");
            assert_eq!(outcome.summary().n_values, 10);
            assert!(outcome.conf_int().is_some());
        }
    }

    // Tests skewed distances fail Shapiro-Wilk and fall back to the Wilcoxon test
    // Verified by treating every group as normal
    #[test]
    fn test_skewed_distances_use_wilcoxon() {
        // Six distances of 1, three of 1.41 and one of 5.66
        let partners = [2, 2, 2, 2, 2, 2, 7, 7, 7, 25];
        let records: Vec<PlateRecord> = partners
            .iter()
            .zip(1..)
            .map(|(&spot, id)| record(id, &[1, spot]))
            .collect();
        let mut rng = StdRng::seed_from_u64(17);
        let result = run(&records, &settings(1), &mut rng, &mut |_| {}).expect("valid");

        for normality in &result.normality {
            let test = normality.test.expect("values differ");
            assert!(test.p_value < 0.001, "p = {}", test.p_value);
            assert!(!normality.normal);
        }
        assert_eq!(result.location.len(), 2);
        for outcome in &result.location {
            let LocationOutcome::Wilcoxon(wilcoxon) = outcome else {
                panic!("expected a Wilcoxon test, got {outcome:?}");
            };
            let shift = wilcoxon.shift.expect("values differ");
            assert!(shift.conf_int.0 - 1e-3 <= shift.estimate, "{shift:?}");
            assert!(shift.estimate <= shift.conf_int.1 + 1e-3, "{shift:?}");
        }
    }

    // Tests identical distances have no normality result and use the Wilcoxon test
    #[test]
    fn test_identical_distances_use_wilcoxon() {
        let records: Vec<PlateRecord> = (1..=10).map(|id| record(id, &[1, 2])).collect();
        let mut rng = StdRng::seed_from_u64(2);
        let result = run(&records, &settings(1), &mut rng, &mut |_| {}).expect("valid");

        for normality in &result.normality {
            assert_eq!(normality.test, None);
            assert!(!normality.normal);
        }
        assert!(
            result
                .location
                .iter()
                .all(|outcome| matches!(outcome, LocationOutcome::Wilcoxon(_)))
        );
    }

    // Tests groups with enough distances get a chi-squared test
    #[test]
    fn test_chi_squared_for_large_groups() {
        let records: Vec<PlateRecord> = (1..=130).map(|id| record(id, &[1, 2, 6, 7])).collect();
        let mut rng = StdRng::seed_from_u64(13);
        let result = run(&records, &settings(1), &mut rng, &mut |_| {}).expect("valid");

        let groups: Vec<&str> = result
            .chi_squared
            .iter()
            .map(|outcome| outcome.summary.group.as_str())
            .collect();
        assert_eq!(groups, vec!["4", "2-24"]);
        for outcome in &result.chi_squared {
            assert_eq!(outcome.test.df, 13);
            assert!(outcome.remarks.starts_with("Significant; Attraction"));
        }
    }

    // Tests a selection without plates of two spots ends the analysis
    #[test]
    fn test_no_distances() {
        let records = vec![record(1, &[4]), record(2, &[])];
        let mut rng = StdRng::seed_from_u64(1);
        let result = run(&records, &settings(1), &mut rng, &mut |_| {});
        assert!(matches!(result, Err(AnalysisError::EmptySelection { .. })));
    }
}
