//! Tests for group summaries, test outcomes and repeat tallies

#[cfg(test)]
mod tests {
    use setlyze::algorithm::outcome::{
        GroupValues, RepeatTallies, chi_squared_outcome, wilcoxon_outcome,
    };
    use setlyze::analysis::remarks::{Comparison, Conclusion};

    fn separated_group() -> GroupValues {
        let mut group = GroupValues::new("3");
        group.add_plate(&[1.0, 1.1, 1.2], &[3.0, 3.1, 3.2]);
        group.add_plate(&[1.3, 1.4, 1.5], &[3.3, 3.4, 3.5]);
        group
    }

    // Tests a group summary holds sizes and means
    #[test]
    fn test_group_summary() {
        let summary = separated_group()
            .summary()
            .expect("equal counts")
            .expect("enough values");
        assert_eq!(summary.group, "3");
        assert_eq!(summary.n_plates, 2);
        assert_eq!(summary.n_values, 6);
        assert!((summary.mean_observed - 1.25).abs() < 1e-12);
        assert!((summary.mean_expected - 3.25).abs() < 1e-12);
    }

    // Tests groups with fewer than two values are not tested
    #[test]
    fn test_small_group_skipped() {
        let mut group = GroupValues::new("2");
        group.add_plate(&[1.0], &[2.0]);
        assert_eq!(group.summary().expect("equal counts"), None);
        assert_eq!(
            wilcoxon_outcome(&group, Comparison::SpotDistance, 0.05).expect("valid"),
            None
        );
    }

    // Tests a count mismatch inside a group is reported
    #[test]
    fn test_group_mismatch() {
        let mut group = GroupValues::new("broken");
        group.add_plate(&[1.0, 2.0], &[1.0]);
        assert!(group.summary().is_err());
    }

    // Tests the Wilcoxon outcome of separated samples reads as attraction
    #[test]
    fn test_wilcoxon_outcome() {
        let outcome = wilcoxon_outcome(&separated_group(), Comparison::SpotDistance, 0.05)
            .expect("valid")
            .expect("testable");
        assert!(outcome.test.p_value < 0.01);
        assert_eq!(outcome.remarks, "Significant; Attraction; P < 0.01; n < 20");
    }

    // Tests chi-squared outcomes are dropped when expected counts are small
    #[test]
    fn test_chi_squared_outcome_small_expected() {
        let group = separated_group();
        let small = chi_squared_outcome(
            &group,
            &[4.0, 2.0],
            &[0.5, 0.5],
            Comparison::SpotDistance,
            0.05,
        )
        .expect("valid");
        assert!(small.is_none());

        let large = chi_squared_outcome(
            &group,
            &[40.0, 20.0],
            &[0.5, 0.5],
            Comparison::SpotDistance,
            0.05,
        )
        .expect("valid")
        .expect("reliable");
        assert_eq!(large.test.df, 1);
        assert_eq!(large.summary.n_values, 6);
    }

    // Tests tallies count significant repeats per direction and the summary p-value
    // Verified by counting every repeat as significant
    #[test]
    fn test_repeat_tallies() {
        let mut tallies = RepeatTallies {
            repeats: 4,
            groups: Vec::new(),
        };
        let significant = separated_group();
        let mut equal = GroupValues::new("equal");
        equal.add_plate(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);

        for _ in 0..3 {
            tallies
                .record(&significant, Comparison::SpotDistance, 0.05)
                .expect("valid");
        }
        tallies
            .record(&equal, Comparison::SpotDistance, 0.05)
            .expect("valid");

        let tally = tallies.get("3").expect("recorded");
        assert_eq!(tally.n_significant, 3);
        assert_eq!(tally.major(), Some((Conclusion::Attraction, 3)));
        assert!((tally.summary_p_value(4) - 0.25).abs() < 1e-12);

        let equal_tally = tallies.get("equal").expect("recorded even when not significant");
        assert_eq!(equal_tally.n_significant, 0);
        assert_eq!(equal_tally.major(), None);
        assert!((equal_tally.summary_p_value(4) - 1.0).abs() < 1e-12);
        assert_eq!(tallies.groups.len(), 2);
    }
}
