// =-=-= limit.rs =-=-=
// `enforce_max_depth` (4.C): the length limiter.
//
// :: An unconstrained Huffman tree can be arbitrarily deep for a
// :: sufficiently skewed (Fibonacci-like) frequency distribution. This
// :: rewrites the per-leaf lengths so none exceeds `max_len`, adding back
// :: as few total bits as the "package-merge alternative" technique used
// :: by zstd-family coders allows.
//
// :: Operates directly on the leaf portion of the node array produced by
// :: `build_unconstrained_tree` (indices `1..=k`, sorted descending by
// :: count, so index k is always the deepest, smallest-count leaf).

use crate::node::Node;

/// Rewrite `nodes[1..=k]`'s lengths so that none exceeds `max_len`.
///
/// `max_len` must be at least 1. If the tree is already within bound, this
/// is a no-op. On return, `Σ 2^(-n_bits)` over `nodes[1..=k]` equals 1
/// exactly (Kraft equality) and every `n_bits <= max_len`.
pub fn enforce_max_depth(nodes: &mut [Node], k: usize, max_len: u8) {
    if k == 0 {
        return;
    }
    let largest_bits = nodes[k].n_bits;
    if largest_bits <= max_len {
        return;
    }

    // --- Step 1: clamp everything past max_len, tallying the Kraft deficit ---
    let base_cost: i64 = 1i64 << (largest_bits - max_len);
    let mut total_cost: i64 = 0;
    let mut n = k;
    while nodes[n].n_bits > max_len {
        total_cost += base_cost - (1i64 << (largest_bits - nodes[n].n_bits));
        nodes[n].n_bits = max_len;
        n -= 1;
    }
    while nodes[n].n_bits == max_len {
        n -= 1;
    }
    total_cost >>= (largest_bits - max_len) as u32;

    // Leftmost index currently at length max_len; the tail of this range,
    // index k, never moves (it is always the globally deepest leaf).
    let mut max_len_left_edge = n + 1;

    // rank_last[d] = rightmost (smallest-count) leaf currently at length
    // (max_len - d), for d in 1..=max_len-1. Populated by a single
    // descending scan, since lengths are non-increasing as the index drops.
    let mut rank_last: Vec<Option<usize>> = vec![None; max_len as usize];
    {
        let mut current_bits = max_len;
        for pos in (1..=n).rev() {
            if nodes[pos].n_bits >= current_bits {
                continue;
            }
            current_bits = nodes[pos].n_bits;
            let d = (max_len - current_bits) as usize;
            rank_last[d] = Some(pos);
        }
    }

    // --- Step 2: repay the deficit by lengthening the cheapest candidates ---
    while total_cost > 0 {
        let mut d = highbit(total_cost) + 1;
        if d > max_len as i64 - 1 {
            d = max_len as i64 - 1;
        }

        // Walk d downward: prefer lengthening one node at rank d over two
        // nodes at rank d-1 whenever the single node costs no more.
        while d > 1 {
            let high = rank_last[d as usize];
            let Some(hp) = high else {
                d -= 1;
                continue;
            };
            let Some(lp) = rank_last[(d - 1) as usize] else {
                break;
            };
            let high_total = nodes[hp].count as u64;
            let low_total = 2 * nodes[lp].count as u64;
            if high_total <= low_total {
                break;
            }
            d -= 1;
        }
        while rank_last[d as usize].is_none() {
            d += 1;
        }

        let idx = rank_last[d as usize].expect("a repay target always exists");
        let orig_len = max_len - d as u8;
        nodes[idx].n_bits += 1;
        total_cost -= 1i64 << (d - 1);

        // The node just lengthened joins rank d-1 (or the max_len group,
        // when d was 1); it only becomes that group's tracked member if the
        // group was empty; a nonempty group's rightmost member always has a
        // larger index (smaller count) than idx already.
        if d == 1 {
            if idx < max_len_left_edge {
                max_len_left_edge = idx;
            }
        } else if rank_last[(d - 1) as usize].is_none() {
            rank_last[(d - 1) as usize] = Some(idx);
        }

        // Rank d loses idx; its new rightmost is idx-1, if that leaf still
        // has the un-lengthened length (i.e. the group had more members).
        rank_last[d as usize] = if idx > 1 && nodes[idx - 1].n_bits == orig_len {
            Some(idx - 1)
        } else {
            None
        };
    }

    // --- Step 3: overshoot correction ---
    // The sentinel at index 0 always has n_bits == 0 != max_len, so
    // max_len_left_edge never underflows below 1 here: the group at
    // max_len always has at least the original deepest leaf, index k.
    while total_cost < 0 {
        nodes[max_len_left_edge].n_bits = max_len - 1;
        max_len_left_edge += 1;
        total_cost += 1;
    }
}

/// `⌊log2(x)⌋` for a strictly positive `x`.
#[inline]
fn highbit(x: i64) -> i64 {
    debug_assert!(x > 0);
    63 - (x as u64).leading_zeros() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{build_unconstrained_tree, sort_by_frequency};

    fn kraft_sum(nodes: &[Node], k: usize) -> f64 {
        (1..=k).map(|i| 2f64.powi(-(nodes[i].n_bits as i32))).sum()
    }

    fn fibonacci_counts(n: usize) -> Vec<u32> {
        let mut counts = vec![1u32, 1];
        while counts.len() < n {
            let next = counts[counts.len() - 1] + counts[counts.len() - 2];
            counts.push(next);
        }
        counts.truncate(n);
        counts
    }

    #[test]
    fn already_within_bound_is_untouched() {
        let count = vec![10, 5, 5, 1, 1];
        let mut nodes = sort_by_frequency(&count);
        let shape = build_unconstrained_tree(&mut nodes, count.len() - 1);
        let before: Vec<u8> = (1..=shape.non_null_rank).map(|i| nodes[i].n_bits).collect();
        enforce_max_depth(&mut nodes, shape.non_null_rank, 12);
        let after: Vec<u8> = (1..=shape.non_null_rank).map(|i| nodes[i].n_bits).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn pathological_fibonacci_distribution_is_repaired() {
        // A Fibonacci-weighted count vector drives the unconstrained tree
        // to depth (n - 1); force it down to 11 bits.
        let count = fibonacci_counts(18);
        let mut nodes = sort_by_frequency(&count);
        let shape = build_unconstrained_tree(&mut nodes, count.len() - 1);
        let unconstrained_max = (1..=shape.non_null_rank).map(|i| nodes[i].n_bits).max().unwrap();
        assert!(unconstrained_max > 11, "test fixture should exceed the bound");

        enforce_max_depth(&mut nodes, shape.non_null_rank, 11);

        let max_len = (1..=shape.non_null_rank).map(|i| nodes[i].n_bits).max().unwrap();
        assert!(max_len <= 11);
        assert!((kraft_sum(&nodes, shape.non_null_rank) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn kraft_equality_holds_across_many_distributions() {
        for seed in 1..20u32 {
            let m = 40 + (seed as usize % 30);
            let count: Vec<u32> = (0..=m)
                .map(|i| {
                    let x = (i as u32).wrapping_mul(2654435761).wrapping_add(seed);
                    1 + (x % 5000)
                })
                .collect();
            let mut nodes = sort_by_frequency(&count);
            let shape = build_unconstrained_tree(&mut nodes, m);
            enforce_max_depth(&mut nodes, shape.non_null_rank, 11);
            let max_len = (1..=shape.non_null_rank).map(|i| nodes[i].n_bits).max().unwrap();
            assert!(max_len <= 11);
            assert!((kraft_sum(&nodes, shape.non_null_rank) - 1.0).abs() < 1e-9);
        }
    }
}
