//! Tests for spot pairs and random spot layouts

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use setlyze::spatial::combinations::{
        combinations_with_replacement, inter_pairs, intra_pairs, pair_count, random_spots,
    };
    use setlyze::spatial::plate::Spot;

    fn spot_list(numbers: &[usize]) -> Vec<Spot> {
        numbers
            .iter()
            .map(|&n| Spot::new(n).expect("valid spot"))
            .collect()
    }

    // Tests intra pairs hold every unordered pair once, n choose 2 in total
    // Verified by iterating over ordered pairs
    #[test]
    fn test_intra_pairs_count_and_order() {
        let pairs = intra_pairs(&spot_list(&[1, 7, 13]));
        let numbers: Vec<(usize, usize)> =
            pairs.iter().map(|(a, b)| (a.number(), b.number())).collect();
        assert_eq!(numbers, vec![(1, 7), (1, 13), (7, 13)]);

        for n in 0..=25 {
            let spots: Vec<Spot> = Spot::all().take(n).collect();
            assert_eq!(intra_pairs(&spots).len(), pair_count(n));
            assert_eq!(pair_count(n), n * n.saturating_sub(1) / 2);
        }
    }

    // Tests no pairs for zero or one spot
    #[test]
    fn test_intra_pairs_small_records() {
        assert!(intra_pairs(&[]).is_empty());
        assert!(intra_pairs(&spot_list(&[5])).is_empty());
    }

    // Tests inter pairs form the full product including shared spots
    #[test]
    fn test_inter_pairs_product() {
        let a = spot_list(&[1, 2]);
        let b = spot_list(&[2, 3, 4]);
        let pairs = inter_pairs(&a, &b);
        assert_eq!(pairs.len(), 6);
        assert!(pairs.iter().any(|(x, y)| x == y));
        assert!(inter_pairs(&a, &[]).is_empty());
    }

    // Tests random spots are distinct, sorted, reproducible and bounded
    // Verified by sampling with replacement
    #[test]
    fn test_random_spots() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in [0, 1, 12, 25] {
            let spots = random_spots(&mut rng, n).expect("n within plate");
            assert_eq!(spots.len(), n);
            assert!(spots.windows(2).all(|w| w[0] < w[1]), "sorted and distinct");
        }
        assert!(random_spots(&mut rng, 26).is_err());

        let first = random_spots(&mut StdRng::seed_from_u64(3), 10).expect("valid");
        let second = random_spots(&mut StdRng::seed_from_u64(3), 10).expect("valid");
        assert_eq!(first, second);
    }

    // Tests combinations with replacement cover a <= b once each
    #[test]
    fn test_combinations_with_replacement() {
        assert_eq!(
            combinations_with_replacement(3),
            vec![(1, 1), (1, 2), (1, 3), (2, 2), (2, 3), (3, 3)]
        );
        assert_eq!(combinations_with_replacement(25).len(), 325);
        assert!(combinations_with_replacement(0).is_empty());
    }
}
