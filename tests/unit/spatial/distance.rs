//! Tests for spot distances, the lookup table and distance probabilities

#[cfg(test)]
mod tests {
    use setlyze::spatial::distance::{
        DistanceKey, DistanceKind, DistanceTable, distance, distance_counts, distance_frequency,
        distance_probabilities, inter_distances, intra_distances, spot_distance,
    };
    use setlyze::spatial::plate::{PositionDifference, Spot};

    fn spot(n: usize) -> Spot {
        Spot::new(n).expect("valid spot")
    }

    // Tests the arithmetic distance rounds to two decimals
    #[test]
    fn test_distance_rounding() {
        assert!((distance(0, 0) - 0.0).abs() < f64::EPSILON);
        assert!((distance(1, 1) - 1.41).abs() < 1e-9);
        assert!((distance(2, 1) - 2.24).abs() < 1e-9);
        assert!((distance(4, 4) - 5.66).abs() < 1e-9);
        assert!((distance(3, 4) - 5.0).abs() < 1e-9);
    }

    // Tests the lookup table equals the arithmetic form for every offset
    // Verified by changing one table entry
    #[test]
    fn test_lookup_matches_arithmetic() {
        let table = DistanceTable::new();
        for horizontal in 0..5 {
            for vertical in 0..5 {
                let looked_up = table
                    .lookup(PositionDifference {
                        horizontal,
                        vertical,
                    })
                    .expect("offset on plate");
                assert!(
                    (looked_up - distance(horizontal, vertical)).abs() < 1e-9,
                    "offset ({horizontal}, {vertical})"
                );
            }
        }
        assert!(
            table
                .lookup(PositionDifference {
                    horizontal: 5,
                    vertical: 0
                })
                .is_none()
        );
    }

    // Tests spot distances are symmetric and zero only for the same spot
    #[test]
    fn test_spot_distance_symmetric() {
        for a in Spot::all() {
            for b in Spot::all() {
                let d = spot_distance(a, b);
                assert!((d - spot_distance(b, a)).abs() < f64::EPSILON);
                assert_eq!(d == 0.0, a == b);
            }
        }
        assert!((spot_distance(spot(1), spot(25)) - 5.66).abs() < 1e-9);
    }

    // Tests pair totals of a full plate and the well known counts
    // Verified by including same-spot pairs in intra distances
    #[test]
    fn test_distance_counts() {
        let intra = distance_counts(DistanceKind::Intra);
        let inter = distance_counts(DistanceKind::Inter);
        assert_eq!(intra.values().sum::<usize>(), 300);
        assert_eq!(inter.values().sum::<usize>(), 625);
        assert_eq!(intra.len(), 14);
        assert_eq!(inter.len(), 15);

        assert_eq!(intra.get(&DistanceKey::from_distance(1.0)), Some(&40));
        assert_eq!(inter.get(&DistanceKey::from_distance(0.0)), Some(&25));
        assert_eq!(intra.get(&DistanceKey::from_distance(0.0)), None);
    }

    // Tests probabilities of each kind sum to one
    #[test]
    fn test_distance_probabilities_sum_to_one() {
        for kind in [DistanceKind::Intra, DistanceKind::Inter] {
            let sum: f64 = distance_probabilities(kind).values().sum();
            assert!((sum - 1.0).abs() < 1e-12, "{kind:?} sums to {sum}");
        }
        let intra = distance_probabilities(DistanceKind::Intra);
        let p_one = intra
            .get(&DistanceKey::from_distance(1.0))
            .copied()
            .unwrap_or_default();
        assert!((p_one - 40.0 / 300.0).abs() < 1e-12);
    }

    // Tests frequencies list every possible distance and reject unknown ones
    #[test]
    fn test_distance_frequency() {
        let distances = intra_distances(&[spot(1), spot(2), spot(3)]);
        let frequencies = distance_frequency(&distances, DistanceKind::Intra).expect("known");
        assert_eq!(frequencies.len(), 14);
        assert_eq!(frequencies.get(&DistanceKey::from_distance(1.0)), Some(&2));
        assert_eq!(frequencies.get(&DistanceKey::from_distance(2.0)), Some(&1));
        assert_eq!(frequencies.values().sum::<usize>(), 3);

        assert!(distance_frequency(&[0.0], DistanceKind::Intra).is_err());
        assert!(distance_frequency(&[1.5], DistanceKind::Inter).is_err());
        let inter = inter_distances(&[spot(1)], &[spot(1), spot(2)]);
        assert!(distance_frequency(&inter, DistanceKind::Inter).is_ok());
    }

    // Tests distance keys compare exactly and display two decimals
    #[test]
    fn test_distance_key() {
        let key = DistanceKey::from_distance(2.24);
        assert_eq!(key, DistanceKey::from_distance(2.240_000_1));
        assert!((key.value() - 2.24).abs() < 1e-12);
        assert_eq!(key.to_string(), "2.24");
    }
}
