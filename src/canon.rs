// =-=-= canon.rs =-=-=
// Canonical assignment (4.D): turn per-leaf lengths into a `CTable` of
// right-aligned canonical codewords.
//
// :: Called once per block, after `enforce_max_depth` has brought every
// :: length within bound. Also reused by `table::read_table` (4.F) to
// :: rebuild a `CTable` from a deserialized weight vector, since both
// :: paths start from "a length per symbol" and need the same recurrence.

use crate::config::SYMBOL_MAX;
use crate::node::Node;

/// Per-symbol codeword and its bit length. `n_bits == 0` means the symbol
/// does not occur in the block that produced this entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CElt {
    pub value: u16,
    pub n_bits: u8,
}

/// Symbol -> `CElt` map, always `SYMBOL_MAX + 1` entries wide so every byte
/// value indexes directly without a bounds dance at the call site.
pub type CTable = [CElt; SYMBOL_MAX + 1];

pub fn empty_ctable() -> CTable {
    [CElt::default(); SYMBOL_MAX + 1]
}

/// `assign_codewords` (4.D): build a `CTable` from the node array's final
/// lengths (indices `1..=k`, each carrying a `symbol` and `n_bits`).
///
/// `max_len` bounds how many distinct lengths can appear; lengths `1..=max_len`
/// are the only ones considered.
pub fn assign_codewords(nodes: &[Node], k: usize, max_len: u8) -> CTable {
    let lengths: Vec<(u8, u8)> = (1..=k).map(|i| (nodes[i].symbol, nodes[i].n_bits)).collect();
    assign_from_lengths(&lengths, max_len)
}

/// Shared core of 4.D: given `(symbol, n_bits)` pairs (in any order) and the
/// table's `max_len`, compute canonical codewords and fill a `CTable`.
///
/// This is also how `table::read_table` (4.F) reconstructs a `CTable` from a
/// deserialized weight vector, since canonical assignment only depends on
/// "how many symbols share each length", not on how those lengths arose.
pub fn assign_from_lengths(lengths: &[(u8, u8)], max_len: u8) -> CTable {
    let max_len = max_len as usize;
    let mut nb_per_rank = vec![0u32; max_len + 1];
    for &(_, n_bits) in lengths {
        if n_bits > 0 {
            nb_per_rank[n_bits as usize] += 1;
        }
    }

    let mut val_per_rank = vec![0u32; max_len + 2];
    for len in (1..max_len).rev() {
        val_per_rank[len] = (val_per_rank[len + 1] + nb_per_rank[len + 1]) >> 1;
    }

    let mut table = empty_ctable();
    // Symbols sharing a length get consecutive codewords in increasing
    // symbol order (invariant 3.4), so sort the assignment pass by symbol.
    let mut ordered: Vec<(u8, u8)> = lengths.iter().copied().filter(|&(_, n)| n > 0).collect();
    ordered.sort_by_key(|&(sym, _)| sym);
    for (sym, n_bits) in ordered {
        let slot = &mut val_per_rank[n_bits as usize];
        table[sym as usize] = CElt {
            value: *slot as u16,
            n_bits,
        };
        *slot += 1;
    }
    table
}

/// `validate_ctable` (§7): every symbol with nonzero `count` must have a
/// nonzero `n_bits` in `table`. Used before trusting a persisted table in
/// `Check` repeat state (§4.G step 5).
pub fn validate_ctable(table: &CTable, count: &[u32]) -> bool {
    count.iter().enumerate().all(|(s, &c)| c == 0 || table[s].n_bits > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{build_unconstrained_tree, sort_by_frequency};

    #[test]
    fn canonical_ordering_increases_with_symbol() {
        let count = vec![10, 1, 1, 1, 1];
        let mut nodes = sort_by_frequency(&count);
        let shape = build_unconstrained_tree(&mut nodes, count.len() - 1);
        let table = assign_codewords(&nodes, shape.non_null_rank, 12);

        let mut by_len: Vec<(u8, u8, u16)> = (0..count.len())
            .filter(|&s| table[s].n_bits > 0)
            .map(|s| (table[s].n_bits, s as u8, table[s].value))
            .collect();
        by_len.sort_by_key(|&(n, s, _)| (n, s));

        let mut last: Option<(u8, u16)> = None;
        for (n, _, v) in by_len {
            if let Some((last_n, last_v)) = last {
                if last_n == n {
                    assert_eq!(v, last_v + 1);
                }
            }
            last = Some((n, v));
        }
    }

    #[test]
    fn validate_rejects_uncovered_symbol() {
        let mut table = empty_ctable();
        table[5] = CElt { value: 0, n_bits: 3 };
        let mut count = vec![0u32; 256];
        count[5] = 10;
        count[9] = 3; // not covered by table
        assert!(!validate_ctable(&table, &count));
        count[9] = 0;
        assert!(validate_ctable(&table, &count));
    }
}
