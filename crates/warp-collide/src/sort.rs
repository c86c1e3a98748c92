// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic rank sort.
//!
//! Stable LSD radix sort over signed 32-bit keys: four passes of 8-bit digits
//! with 256 buckets, ping-ponging between two index buffers. Keys are biased
//! by flipping the sign bit so unsigned digit order equals signed key order.
//! Ties keep their original relative order, which is what makes the output
//! independent of how the keys were produced.

const RADIX_BITS: u32 = 8;
const BUCKETS: usize = 1 << RADIX_BITS;
const PASSES: u32 = 4;

#[inline]
fn biased(key: i32) -> u32 {
    key.cast_unsigned() ^ 0x8000_0000
}

#[inline]
fn digit(key: u32, pass: u32) -> usize {
    ((key >> (pass * RADIX_BITS)) & 0xFF) as usize
}

/// Maps an unsigned key onto an `i32` with the same ordering.
#[inline]
pub fn unsigned_key(value: u32) -> i32 {
    (value ^ 0x8000_0000).cast_signed()
}

/// Returns `ranks` where `ranks[k]` is the original index of the `k`-th
/// smallest key; equal keys appear in ascending original index.
pub fn rank_sort(keys: &[i32]) -> Vec<u32> {
    let mut ranks = Vec::new();
    let mut scratch = Vec::new();
    rank_sort_into(keys, &mut ranks, &mut scratch);
    ranks
}

/// [`rank_sort`] writing into caller-owned buffers, so repeated sorts can
/// reuse allocations. `ranks` receives the result; `scratch` is clobbered.
pub fn rank_sort_into(keys: &[i32], ranks: &mut Vec<u32>, scratch: &mut Vec<u32>) {
    let n = keys.len();
    ranks.clear();
    ranks.extend((0..n).map(|i| u32::try_from(i).unwrap_or(u32::MAX)));
    if n <= 1 {
        return;
    }
    debug_assert!(u32::try_from(n).is_ok(), "rank sort supports at most u32::MAX keys");
    scratch.clear();
    scratch.resize(n, 0);

    let mut counts = [0u32; BUCKETS];
    let mut flip = false;
    for pass in 0..PASSES {
        counts.fill(0);
        for &k in keys {
            counts[digit(biased(k), pass)] += 1;
        }
        // Every key shares this digit: the pass would be the identity.
        if counts.iter().any(|&c| c as usize == n) {
            continue;
        }

        let (src, dst) = if flip {
            (&scratch[..], &mut ranks[..])
        } else {
            (&ranks[..], &mut scratch[..])
        };

        // Prefix sums
        let mut sum = 0u32;
        for c in &mut counts {
            let t = *c;
            *c = sum;
            sum += t;
        }

        // Stable scatter
        for &idx in src {
            let b = digit(biased(keys[idx as usize]), pass);
            dst[counts[b] as usize] = idx;
            counts[b] += 1;
        }
        flip = !flip;
    }

    if flip {
        ranks.copy_from_slice(&scratch[..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_mixed_signs_stably() {
        assert_eq!(rank_sort(&[5, -3, 5, 0]), vec![1, 3, 0, 2]);
    }

    #[test]
    fn empty_and_single_are_identity() {
        assert!(rank_sort(&[]).is_empty());
        assert_eq!(rank_sort(&[42]), vec![0]);
    }

    #[test]
    fn extremes_sort_to_the_ends() {
        let keys = [0, i32::MAX, -1, i32::MIN, 1, i32::MIN];
        let ranks = rank_sort(&keys);
        let sorted: Vec<i32> = ranks.iter().map(|&r| keys[r as usize]).collect();
        assert_eq!(sorted, vec![i32::MIN, i32::MIN, -1, 0, 1, i32::MAX]);
        assert_eq!(&ranks[..2], &[3, 5]);
    }

    #[test]
    fn unsigned_key_preserves_order() {
        assert!(unsigned_key(0) < unsigned_key(1));
        assert!(unsigned_key(0x7FFF_FFFF) < unsigned_key(0x8000_0000));
        assert!(unsigned_key(u32::MAX - 1) < unsigned_key(u32::MAX));
    }
}
