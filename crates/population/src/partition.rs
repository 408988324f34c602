use rand::Rng;

use crate::game_modes::SMALL_TEAM_MODE;

/// Populations at or below this size are submitted as one batch.
pub const SINGLE_BATCH_THRESHOLD: usize = 4;

pub fn team_size_limit(pool_name: &str, default_size: usize, small_size: usize) -> usize {
    if pool_name.contains(SMALL_TEAM_MODE) {
        small_size
    } else {
        default_size
    }
}

/// Splits `items` into consecutive batches whose lengths are drawn uniformly
/// from `[1, limit]`. Order is preserved and every item lands in exactly one
/// batch.
pub fn split_into_batches<T>(items: Vec<T>, limit: usize, rng: &mut impl Rng) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    if items.len() <= SINGLE_BATCH_THRESHOLD {
        return vec![items];
    }

    let limit = limit.max(1);
    let mut batches = Vec::new();
    let mut rest = items;
    while !rest.is_empty() {
        let len = rng.gen_range(1..=limit).min(rest.len());
        let tail = rest.split_off(len);
        batches.push(rest);
        rest = tail;
    }
    batches
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{split_into_batches, team_size_limit};

    #[test]
    fn small_inputs_stay_in_one_batch() {
        for len in 1..=4 {
            let items: Vec<usize> = (0..len).collect();
            let batches = split_into_batches(items.clone(), 1, &mut StdRng::seed_from_u64(0));
            assert_eq!(batches, vec![items]);
        }
    }

    #[test]
    fn empty_input_yields_no_batches() {
        let batches = split_into_batches(Vec::<u8>::new(), 4, &mut StdRng::seed_from_u64(0));
        assert!(batches.is_empty());
    }

    #[test]
    fn zero_limit_is_treated_as_one() {
        let batches = split_into_batches((0..6).collect(), 0, &mut StdRng::seed_from_u64(2));
        assert_eq!(batches.len(), 6);
    }

    #[test]
    fn survival_pools_use_the_small_team_size() {
        assert_eq!(team_size_limit("Survival2", 8, 2), 2);
        assert_eq!(team_size_limit("Classic1", 8, 2), 8);
    }

    proptest! {
        #[test]
        fn batches_cover_input_in_order_within_limit(
            seed in any::<u64>(),
            len in 5usize..200,
            limit in 1usize..12,
        ) {
            let items: Vec<usize> = (0..len).collect();
            let batches = split_into_batches(items.clone(), limit, &mut StdRng::seed_from_u64(seed));

            for batch in &batches {
                prop_assert!(!batch.is_empty());
                prop_assert!(batch.len() <= limit);
            }
            let flattened: Vec<usize> = batches.into_iter().flatten().collect();
            prop_assert_eq!(flattened, items);
        }

        #[test]
        fn at_most_four_items_is_always_a_single_batch(
            seed in any::<u64>(),
            len in 1usize..=4,
            limit in 1usize..12,
        ) {
            let items: Vec<usize> = (0..len).collect();
            let batches = split_into_batches(items.clone(), limit, &mut StdRng::seed_from_u64(seed));
            prop_assert_eq!(batches, vec![items]);
        }
    }
}
