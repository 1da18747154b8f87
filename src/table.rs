// =-=-= table.rs =-=-=
// Table serializer (4.E) and deserializer (4.F): turn a finalized `CTable`
// into the compact weight-vector wire form, and back.
//
// :: Weight `w = L + 1 - n_bits` for an occurring symbol, `0` for an absent
// :: one. The last symbol (index `m`, the caller's max symbol value) is
// :: never transmitted: its weight is recoverable from Kraft completion, so
// :: `read_stats` below reconstructs it from the others.

use crate::canon::{assign_from_lengths, empty_ctable, CTable};
use crate::config::L_MAX;
use crate::error::{HuffError, Result};
use crate::fse;

#[inline]
fn highbit64(x: u64) -> u32 {
    debug_assert!(x > 0);
    63 - x.leading_zeros()
}

/// Per-symbol weight for symbols `[0, m)`; symbol `m` itself is omitted.
fn weights_from_ctable(table: &CTable, m: usize, max_len: u8) -> Vec<u8> {
    (0..m)
        .map(|s| {
            let elt = table[s];
            if elt.n_bits == 0 {
                0
            } else {
                max_len + 1 - elt.n_bits
            }
        })
        .collect()
}

/// `write_table` (4.E): serialize `table`'s lengths for symbols `0..=m` as a
/// weight vector, trying the FSE-compressed form first and falling back to
/// raw nibble packing.
///
/// `m` is the caller's max symbol value (so `m + 1` symbols participate;
/// `m` itself must have nonzero count, as `compress_block` guarantees).
pub fn write_table(table: &CTable, m: usize, max_len: u8) -> Result<Vec<u8>> {
    if m == 0 {
        return Err(HuffError::generic("write_table: single-symbol table has nothing to transmit"));
    }

    let weights = weights_from_ctable(table, m, max_len);

    // FSE branch: payload is [m-1][fse-compressed weight block], and the
    // discriminator is the total byte length of that payload. Packing `m-1`
    // in front lets `read_table` recover the symbol count purely from the
    // FSE branch's own bytes, since the discriminator here is a size, not
    // `m` itself (unlike the raw branch, where `m` rides in the byte value).
    let fse_blob = fse::compress_weights(&weights);
    let h = 1 + fse_blob.len();
    if h > 1 && h * 2 < m && h < 128 {
        let mut out = Vec::with_capacity(1 + h);
        out.push(h as u8);
        out.push((m - 1) as u8);
        out.extend_from_slice(&fse_blob);
        return Ok(out);
    }

    if m > 128 {
        return Err(HuffError::generic("write_table: raw header requires at most 128 symbols"));
    }

    let mut out = Vec::with_capacity(1 + (m + 1) / 2);
    out.push(128 + (m - 1) as u8);
    for pair in weights.chunks(2) {
        let hi = pair[0];
        let lo = pair.get(1).copied().unwrap_or(0);
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

/// `read_stats`: recover the table's `max_len` and the omitted last symbol's
/// weight from the transmitted weight vector, via Kraft completion.
///
/// `Σ 2^(w_i - 1)` over the transmitted weights equals `2^max_len` minus the
/// last symbol's own `2^(w_last - 1)` term; since the last term must itself
/// be a power of two, both `max_len` and `w_last` fall out of a couple of
/// `highbit` calls on the partial sum.
fn read_stats(weights: &[u8]) -> Result<(u8, u8)> {
    let err = || HuffError::generic("malformed weight table: non-canonical weight stats");
    let partial: u64 = weights
        .iter()
        .map(|&w| if w == 0 { 0 } else { 1u64 << (w - 1) })
        .sum();
    if partial == 0 {
        return Err(err());
    }
    let max_len = highbit64(partial) as u8 + 1;
    if max_len > L_MAX {
        return Err(HuffError::TableLogTooLarge(max_len));
    }
    let total = 1u64 << max_len;
    let rest = total.checked_sub(partial).ok_or_else(err)?;
    if rest == 0 {
        return Err(err());
    }
    let last_weight = highbit64(rest) as u8 + 1;
    if 1u64 << (last_weight - 1) != rest || last_weight > max_len {
        return Err(err());
    }
    for &w in weights {
        if w as u8 > max_len {
            return Err(err());
        }
    }
    Ok((max_len, last_weight))
}

/// `read_table` (4.F): inverse of `write_table`. Returns the reconstructed
/// `CTable`, the max symbol value `m`, the table's `max_len`, and the number
/// of bytes consumed from `data`.
pub fn read_table(data: &[u8]) -> Result<(CTable, usize, u8, usize)> {
    let err = || HuffError::generic("malformed table header");
    let discriminator = *data.first().ok_or_else(err)?;

    let (weights, m) = if discriminator < 128 {
        let h = discriminator as usize;
        let payload = data.get(1..1 + h).ok_or_else(err)?;
        let m = *payload.first().ok_or_else(err)? as usize + 1;
        let weights = fse::decompress_weights(&payload[1..], m)?;
        (weights, m)
    } else {
        let m = (discriminator - 128) as usize + 1;
        let n_bytes = (m + 1) / 2;
        let payload = data.get(1..1 + n_bytes).ok_or_else(err)?;
        let mut weights = vec![0u8; m];
        for (i, &byte) in payload.iter().enumerate() {
            let hi = byte >> 4;
            let lo = byte & 0x0f;
            weights[2 * i] = hi;
            if 2 * i + 1 < m {
                weights[2 * i + 1] = lo;
            }
        }
        (weights, m)
    };

    let consumed = if discriminator < 128 {
        1 + discriminator as usize
    } else {
        1 + (m + 1) / 2
    };

    let (max_len, last_weight) = read_stats(&weights)?;

    let mut lengths: Vec<(u8, u8)> = (0..m)
        .map(|s| {
            let w = weights[s];
            let len = if w == 0 { 0 } else { max_len + 1 - w };
            (s as u8, len)
        })
        .collect();
    let last_len = max_len + 1 - last_weight;
    lengths.push((m as u8, last_len));

    let table = assign_from_lengths(&lengths, max_len);
    Ok((table, m, max_len, consumed))
}
