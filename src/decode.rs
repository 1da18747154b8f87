// =-=-= decode.rs =-=-=
// `DTable` (ambient, §L): the decode-side mirror of a `CTable`, plus the
// single- and four-stream decode routines that drive it against a
// `BitReader`.
//
// :: Codewords are written LSB-first (bitstream.rs's "bit-reversed"
// :: convention): a symbol's canonical `value`, `n_bits` wide, has its low
// :: bit land first in the stream. A flat decode table indexed by the next
// :: `max_len` bits therefore needs every entry whose low `n_bits` equal
// :: `value` to map to that symbol, regardless of the (not-yet-decided)
// :: higher bits contributed by whatever follows -- a strided fill, not a
// :: contiguous range.

use crate::bitstream::BitReader;
use crate::canon::CTable;

/// One decode slot per possible `max_len`-bit window.
pub struct DTable {
    entries: Vec<(u8, u8)>,
    max_len: u8,
}

/// Build a `DTable` from a finalized `CTable`. `max_len` must match the
/// `max_len` the table's codewords were assigned under.
pub fn build_dtable(table: &CTable, max_len: u8) -> DTable {
    let size = 1usize << max_len;
    let mut entries = vec![(0u8, 0u8); size];
    for (sym, elt) in table.iter().enumerate() {
        if elt.n_bits == 0 {
            continue;
        }
        let n = elt.n_bits as usize;
        let step = 1usize << n;
        let mut idx = elt.value as usize;
        while idx < size {
            entries[idx] = (sym as u8, elt.n_bits);
            idx += step;
        }
    }
    DTable { entries, max_len }
}

/// Decode exactly `n_symbols` bytes from a single-stream payload (the
/// mirror of `bitstream::encode_single`).
pub fn decode_single(data: &[u8], n_symbols: usize, dtable: &DTable) -> Vec<u8> {
    let mut r = BitReader::new(data);
    let mut out = Vec::with_capacity(n_symbols);
    for _ in 0..n_symbols {
        let window = r.peek_bits(dtable.max_len);
        let (sym, n_bits) = dtable.entries[window as usize];
        out.push(sym);
        r.consume(n_bits);
    }
    out
}

/// Decode a four-stream payload of `n_symbols` total bytes (the mirror of
/// `bitstream::encode_four`): read the 6-byte jump table, then decode each
/// of the four segments independently against the same quarter split
/// `encode_four` used.
pub fn decode_four(data: &[u8], n_symbols: usize, dtable: &DTable) -> crate::error::Result<Vec<u8>> {
    let err = || crate::error::HuffError::generic("truncated four-stream jump table");
    let l0 = u16::from_le_bytes([*data.first().ok_or_else(err)?, *data.get(1).ok_or_else(err)?]) as usize;
    let l1 = u16::from_le_bytes([*data.get(2).ok_or_else(err)?, *data.get(3).ok_or_else(err)?]) as usize;
    let l2 = u16::from_le_bytes([*data.get(4).ok_or_else(err)?, *data.get(5).ok_or_else(err)?]) as usize;

    let seg = (n_symbols + 3) / 4;
    let bounds = [
        seg.min(n_symbols),
        (2 * seg).min(n_symbols),
        (3 * seg).min(n_symbols),
        n_symbols,
    ];
    let counts = [bounds[0], bounds[1] - bounds[0], bounds[2] - bounds[1], bounds[3] - bounds[2]];

    let body = data.get(6..).ok_or_else(err)?;
    let s0 = body.get(..l0).ok_or_else(err)?;
    let s1 = body.get(l0..l0 + l1).ok_or_else(err)?;
    let s2 = body.get(l0 + l1..l0 + l1 + l2).ok_or_else(err)?;
    let s3 = body.get(l0 + l1 + l2..).ok_or_else(err)?;

    let mut out = Vec::with_capacity(n_symbols);
    out.extend(decode_single(s0, counts[0], dtable));
    out.extend(decode_single(s1, counts[1], dtable));
    out.extend(decode_single(s2, counts[2], dtable));
    out.extend(decode_single(s3, counts[3], dtable));
    Ok(out)
}
