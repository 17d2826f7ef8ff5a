use std::collections::HashSet;

/// Compute the sequence numbers that never came back.
///
/// Walks the closed range `1..=transmitted` and emits every number that is
/// not among `observed`. Because only the range drives the scan, loss at
/// the start, at the end and in any number of interior gaps is found the
/// same way. Duplicates in `observed` and values above `transmitted` are
/// ignored. The output is strictly ascending.
pub fn lost_sequence_numbers(observed: &[u32], transmitted: u32) -> Vec<u32> {
    let seen: HashSet<u32> = observed.iter().copied().collect();
    (1..=transmitted).filter(|seq| !seen.contains(seq)).collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn observed_within() -> impl Strategy<Value = (Vec<u32>, u32)> {
        (0u32..500).prop_flat_map(|transmitted| {
            let range: Vec<u32> = (1..=transmitted).collect();
            let observed = prop::sample::subsequence(range, 0..=transmitted as usize).prop_shuffle();
            (observed, Just(transmitted))
        })
    }

    proptest! {
        #[test]
        fn test_lost_partitions_range((observed, transmitted) in observed_within()) {
            let lost = lost_sequence_numbers(&observed, transmitted);

            prop_assert!(lost.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(lost.iter().all(|seq| !observed.contains(seq)));
            prop_assert!(lost.iter().all(|&seq| (1..=transmitted).contains(&seq)));
            prop_assert_eq!(lost.len() + observed.len(), transmitted as usize);
        }
    }
}
