// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
//! Rank sort agrees with a stable comparison sort.

use proptest::prelude::*;
use warp_collide::rank_sort;
use warp_collide::sort::{rank_sort_into, unsigned_key};

fn reference(keys: &[i32]) -> Vec<u32> {
    let mut idx: Vec<u32> = (0..u32::try_from(keys.len()).unwrap_or(u32::MAX)).collect();
    idx.sort_by_key(|&i| keys[i as usize]);
    idx
}

#[test]
fn small_example_keeps_equal_keys_in_input_order() {
    let keys = [5, -3, 5, 0];
    let ranks = rank_sort(&keys);
    assert_eq!(ranks, vec![1, 3, 0, 2]);
    let sorted: Vec<i32> = ranks.iter().map(|&r| keys[r as usize]).collect();
    assert_eq!(sorted, vec![-3, 0, 5, 5]);
}

#[test]
fn extremes_sort_to_the_ends() {
    let keys = [0, i32::MAX, -1, i32::MIN, 1, i32::MIN];
    assert_eq!(rank_sort(&keys), vec![3, 5, 2, 0, 4, 1]);
    assert!(rank_sort(&[]).is_empty());
    assert_eq!(rank_sort(&[42]), vec![0]);
}

#[test]
fn unsigned_keys_keep_unsigned_order() {
    let values = [u32::MAX, 0, 0x8000_0000, 7, 0x7FFF_FFFF];
    let keys: Vec<i32> = values.iter().map(|&v| unsigned_key(v)).collect();
    let sorted: Vec<u32> = rank_sort(&keys).iter().map(|&r| values[r as usize]).collect();
    assert_eq!(sorted, vec![0, 7, 0x7FFF_FFFF, 0x8000_0000, u32::MAX]);
}

proptest! {
    #[test]
    fn matches_stable_sort(keys in prop::collection::vec(any::<i32>(), 0..2_000)) {
        prop_assert_eq!(rank_sort(&keys), reference(&keys));
    }

    #[test]
    fn heavy_duplicates_stay_stable(keys in prop::collection::vec(-4i32..4, 0..2_000)) {
        prop_assert_eq!(rank_sort(&keys), reference(&keys));
    }

    #[test]
    fn reused_buffers_give_the_same_answer(
        a in prop::collection::vec(any::<i32>(), 0..500),
        b in prop::collection::vec(any::<i32>(), 0..500),
    ) {
        let mut ranks = Vec::new();
        let mut scratch = Vec::new();
        rank_sort_into(&a, &mut ranks, &mut scratch);
        prop_assert_eq!(&ranks, &reference(&a));
        rank_sort_into(&b, &mut ranks, &mut scratch);
        prop_assert_eq!(&ranks, &reference(&b));
    }
}
