// =-=-= compress.rs =-=-=
// Block compressor (4.G) and its decode-side mirror: orchestrates
// histogram -> sort -> tree -> limit -> canon -> serialize -> bitstream,
// and applies the table-reuse and incompressibility heuristics.

use crate::bitstream::{encode_four, encode_single};
use crate::canon::{assign_codewords, validate_ctable, CTable};
use crate::config::{Params, BLOCK_SIZE_MAX, L_DEFAULT, L_MAX};
use crate::decode::{build_dtable, decode_four, decode_single, DTable};
use crate::error::{HuffError, Result};
use crate::histogram::count_histogram;
use crate::node::{build_unconstrained_tree, sort_by_frequency};
use crate::table::{read_table, write_table};

/// Repeat state of a persisted table (§3): whether it may be reused without
/// re-validation, should be checked against the current block's histogram
/// first, or must be rebuilt from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatState {
    None,
    Check,
    Valid,
}

/// Per-worker persisted table slot. Holds the last table `compress_block`
/// settled on, so a later call can consider reusing it instead of paying
/// for a fresh header.
///
/// §5: "Callers wishing to use this concurrently must give each worker its
/// own persisted-table slot" -- hence this is plain owned state, not shared.
#[derive(Default)]
pub struct TableContext {
    pub table: Option<CTable>,
    pub max_len: u8,
    pub state: RepeatState,
}

impl Default for RepeatState {
    fn default() -> Self {
        RepeatState::None
    }
}

impl TableContext {
    pub fn new() -> Self {
        Self {
            table: None,
            max_len: 0,
            state: RepeatState::None,
        }
    }
}

/// Result of `compress_block`, mirroring the §4.G return-value sentinels as
/// a Rust enum rather than a side-band integer range: `0` becomes
/// `StoreRaw`, `1` becomes `Rle`, and any other byte count becomes
/// `Compressed`.
pub enum Outcome {
    /// Caller should store the block uncompressed.
    StoreRaw,
    /// The block is a single repeated byte; store it as one byte plus the
    /// original length (tracked by the caller, e.g. the block framer).
    Rle(u8),
    /// A Huffman-coded block. `new_table` is true when `payload` begins
    /// with a table header (§4.E); false when it reuses a table the caller
    /// already has from an earlier block (§4.G step 8 or the repeat fast
    /// paths), in which case `payload` is the bitstream alone.
    Compressed { payload: Vec<u8>, new_table: bool },
}

/// `optimal_table_log`, specified here as the expansion's stand-in for the
/// distilled spec's external heuristic: don't build a bigger table than the
/// block's symbol variety can repay.
fn optimal_table_log(requested: Option<u8>, src_size: usize, m: usize, cap: u8) -> u8 {
    let mut huff_log = requested.unwrap_or(L_DEFAULT).clamp(5, L_MAX).min(cap);
    while huff_log > 5 && (src_size >> huff_log) < m {
        huff_log -= 1;
    }
    huff_log.max(1)
}

/// `cost(T) = Σ T[s].n_bits * count[s]`: the estimated bit cost of encoding
/// this block's symbols under table `T` (§4.G step 8).
fn estimated_cost(table: &CTable, count: &[u32]) -> u64 {
    count.iter().enumerate().map(|(s, &c)| table[s].n_bits as u64 * c as u64).sum()
}

fn ctable_pairs(table: &CTable) -> Vec<(u16, u8)> {
    table.iter().map(|e| (e.value, e.n_bits)).collect()
}

fn encode_payload(src: &[u8], table: &CTable, single_stream: bool) -> Vec<u8> {
    let pairs = ctable_pairs(table);
    if single_stream {
        encode_single(src.iter().copied(), &pairs)
    } else {
        encode_four(src.iter().copied(), &pairs)
    }
}

/// `compress_block` (4.G).
///
/// `max_symbol_value` bounds the bytes `src` may contain; `0` means "no
/// declared cap", taken as `255` (§8 boundary case, via `count_histogram`).
pub fn compress_block(src: &[u8], ctx: &mut TableContext, params: &Params, max_symbol_value: u8) -> Result<Outcome> {
    let src_size = src.len();
    if src_size == 0 {
        return Ok(Outcome::StoreRaw);
    }
    if src_size > BLOCK_SIZE_MAX {
        return Err(HuffError::SrcTooLarge(src_size));
    }

    // Step 2: repeat fast path. Per §9's open question, a `Valid` table is
    // trusted without re-checking it covers this block's symbols -- that is
    // the caller contract `Valid` represents.
    if params.prefer_repeat && ctx.state == RepeatState::Valid {
        if let Some(table) = &ctx.table {
            log::trace!("compress_block: valid repeat fast path over {src_size} bytes");
            let payload = encode_payload(src, table, params.single_stream);
            return Ok(Outcome::Compressed { payload, new_table: false });
        }
    }

    // Step 3: histogram.
    let hist = count_histogram(src, max_symbol_value)?;
    let m = hist.max_symbol_value;
    let ell_max = hist.largest_count;

    // Step 4: trivial cases.
    if ell_max as usize == src_size {
        log::debug!("compress_block: {src_size} identical bytes, emitting RLE");
        return Ok(Outcome::Rle(src[0]));
    }
    if ell_max <= ((src_size as u32) >> 7) + 1 {
        log::debug!("compress_block: distribution too flat to beat {src_size} bytes raw");
        return Ok(Outcome::StoreRaw);
    }

    // Step 5: repeat with validation.
    let mut state = ctx.state;
    if state == RepeatState::Check {
        let valid = ctx.table.as_ref().map(|t| validate_ctable(t, &hist.count)).unwrap_or(false);
        if !valid {
            log::trace!("compress_block: persisted table fails validation against this block, downgrading");
            state = RepeatState::None;
            ctx.state = RepeatState::None;
        }
    }
    if params.prefer_repeat && state != RepeatState::None {
        if let Some(table) = &ctx.table {
            log::trace!("compress_block: validated repeat path over {src_size} bytes");
            let payload = encode_payload(src, table, params.single_stream);
            return Ok(Outcome::Compressed { payload, new_table: false });
        }
    }

    // Step 6: build a fresh table.
    let max_len = params.max_code_len.clamp(1, L_MAX);
    let huff_log = optimal_table_log(params.huff_log, src_size, m as usize, max_len);

    let mut nodes = sort_by_frequency(&hist.count[..=m as usize]);
    let shape = build_unconstrained_tree(&mut nodes, m as usize);
    crate::limit::enforce_max_depth(&mut nodes, shape.non_null_rank, huff_log);
    let table = assign_codewords(&nodes, shape.non_null_rank, huff_log);

    // Step 7: serialize.
    let header = write_table(&table, m as usize, huff_log)?;

    // Step 8: reuse cost check.
    if state != RepeatState::None {
        if let Some(prev_table) = &ctx.table {
            let est_old = estimated_cost(prev_table, &hist.count);
            let est_new = estimated_cost(&table, &hist.count);
            let h_size = header.len();
            if est_old <= h_size as u64 + est_new || h_size + 12 >= src_size {
                log::trace!(
                    "compress_block: reusing persisted table (est_old={est_old}, est_new={est_new}, header={h_size})"
                );
                let payload = encode_payload(src, prev_table, params.single_stream);
                return Ok(Outcome::Compressed { payload, new_table: false });
            }
        }
    }

    // Step 9: incompressibility check.
    if header.len() + 12 >= src_size {
        log::debug!("compress_block: fresh header overhead too high for {src_size} bytes");
        return Ok(Outcome::StoreRaw);
    }

    // Step 10: emit with the fresh table.
    ctx.state = RepeatState::None;
    ctx.max_len = huff_log;
    let mut out = header;
    out.extend(encode_payload(src, &table, params.single_stream));
    ctx.table = Some(table);
    if out.len() + 1 >= src_size {
        log::debug!("compress_block: compressed size {} not beneficial for {src_size} bytes", out.len());
        return Ok(Outcome::StoreRaw);
    }
    Ok(Outcome::Compressed { payload: out, new_table: true })
}

/// Decode-side persisted state, mirroring `TableContext` so a reused-table
/// block (`new_table: false`) can be decoded against the last table a
/// `new_table: true` block established.
#[derive(Default)]
pub struct DecodeContext {
    table: Option<CTable>,
    dtable: Option<DTable>,
    max_len: u8,
}

impl DecodeContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Inverse of `compress_block`'s `Compressed` case for a single block.
/// `n_bytes` is the original (uncompressed) block length, carried alongside
/// the payload by the caller (e.g. the block framer's length prefix).
pub fn decompress_block(
    data: &[u8],
    n_bytes: usize,
    has_header: bool,
    single_stream: bool,
    ctx: &mut DecodeContext,
) -> Result<Vec<u8>> {
    let (dtable, body): (&DTable, &[u8]) = if has_header {
        let (table, _m, max_len, consumed) = read_table(data)?;
        ctx.dtable = Some(build_dtable(&table, max_len));
        ctx.table = Some(table);
        ctx.max_len = max_len;
        (ctx.dtable.as_ref().unwrap(), &data[consumed..])
    } else {
        let dtable = ctx
            .dtable
            .as_ref()
            .ok_or_else(|| HuffError::generic("reused-table block with no prior table"))?;
        (dtable, data)
    };

    if single_stream {
        Ok(decode_single(body, n_bytes, dtable))
    } else {
        decode_four(body, n_bytes, dtable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(src: &[u8], params: &Params) {
        let mut enc_ctx = TableContext::new();
        let mut dec_ctx = DecodeContext::new();
        let outcome = compress_block(src, &mut enc_ctx, params, 0).unwrap();
        match outcome {
            Outcome::StoreRaw => {}
            Outcome::Rle(b) => {
                assert!(src.iter().all(|&x| x == b));
            }
            Outcome::Compressed { payload, new_table } => {
                let decoded = decompress_block(&payload, src.len(), new_table, params.single_stream, &mut dec_ctx).unwrap();
                assert_eq!(decoded, src);
            }
        }
    }

    #[test]
    fn empty_input_stores_raw() {
        let mut ctx = TableContext::new();
        let outcome = compress_block(b"", &mut ctx, &Params::default(), 0).unwrap();
        assert!(matches!(outcome, Outcome::StoreRaw));
    }

    #[test]
    fn all_identical_bytes_is_rle() {
        let src = vec![b'A'; 4];
        let mut ctx = TableContext::new();
        let outcome = compress_block(&src, &mut ctx, &Params::default(), 0).unwrap();
        match outcome {
            Outcome::Rle(b) => assert_eq!(b, b'A'),
            _ => panic!("expected RLE"),
        }
    }

    #[test]
    fn short_alternating_input_stores_raw() {
        let src = b"ABABABAB";
        let mut ctx = TableContext::new();
        let outcome = compress_block(src, &mut ctx, &Params::default(), 0).unwrap();
        assert!(matches!(outcome, Outcome::StoreRaw));
    }

    #[test]
    fn skewed_two_symbol_block_roundtrips() {
        let mut src = vec![b'A'; 512];
        src.extend(vec![b'B'; 512]);
        roundtrip(&src, &Params::default());
    }

    #[test]
    fn zipfian_block_roundtrips_under_default_params() {
        let mut src = Vec::with_capacity(64 * 1024);
        for i in 0..64 * 1024 {
            let sym = (i as f64).sqrt() as u8 % 64;
            src.push(sym);
        }
        roundtrip(&src, &Params::default());
    }

    #[test]
    fn four_stream_block_roundtrips() {
        let mut src = Vec::with_capacity(20_000);
        for i in 0..20_000u32 {
            src.push(((i * 2654435761) % 37) as u8);
        }
        roundtrip(&src, &Params::four_stream());
    }

    #[test]
    fn consecutive_blocks_can_reuse_a_persisted_table() {
        let params = Params::default().with_prefer_repeat(true);
        let mut enc_ctx = TableContext::new();
        let mut dec_ctx = DecodeContext::new();

        let mut block = Vec::with_capacity(8192);
        for i in 0..8192u32 {
            block.push(((i * 2654435761) % 17) as u8);
        }

        let first = compress_block(&block, &mut enc_ctx, &params, 0).unwrap();
        let payload = match first {
            Outcome::Compressed { payload, new_table } => {
                assert!(new_table);
                payload
            }
            _ => panic!("expected a fresh compressed block"),
        };
        let decoded = decompress_block(&payload, block.len(), true, params.single_stream, &mut dec_ctx).unwrap();
        assert_eq!(decoded, block);

        // Frame-layer policy (see frame.rs): after a fresh table, the next
        // block gets a chance to reuse it.
        enc_ctx.state = RepeatState::Check;

        let second = compress_block(&block, &mut enc_ctx, &params, 0).unwrap();
        match second {
            Outcome::Compressed { payload, new_table } => {
                assert!(!new_table, "identical content should reuse the persisted table");
                let decoded = decompress_block(&payload, block.len(), false, params.single_stream, &mut dec_ctx).unwrap();
                assert_eq!(decoded, block);
            }
            _ => panic!("expected a reused compressed block, got a different outcome"),
        }
    }

    #[test]
    fn all_256_symbols_uniform_either_stores_raw_or_roundtrips() {
        let src: Vec<u8> = (0..=255u8).collect();
        let mut enc_ctx = TableContext::new();
        let mut dec_ctx = DecodeContext::new();
        let outcome = compress_block(&src, &mut enc_ctx, &Params::default(), 0).unwrap();
        match outcome {
            Outcome::StoreRaw => {}
            Outcome::Compressed { payload, new_table } => {
                let decoded = decompress_block(&payload, src.len(), new_table, true, &mut dec_ctx).unwrap();
                assert_eq!(decoded, src);
            }
            Outcome::Rle(_) => panic!("256 distinct bytes is never RLE"),
        }
    }
}
