// =-=-= frame.rs =-=-=
// Block framer (4.K, ambient): not part of the distilled core -- it
// explicitly treats this as an external collaborator -- but needed so a
// whole file can move through `compress_block`/`decompress_block` as a
// sequence of blocks, for the CLI and the round-trip tests.
//
// Wire format: a sequence of
//   [tag: u8][orig_len: u32 LE][payload_len: u32 LE][payload: payload_len bytes]
// records. `tag` is `0` (stored: payload is the raw block), `1` (RLE:
// payload is one byte, `orig_len` is the run length), `2` (Huffman, payload
// begins with a table header), or `3` (Huffman, payload reuses the most
// recent table a tag-`2` record established, so it is the bitstream alone).
//
// :: §4.G step 10 resets repeat state to `None` after a fresh table; this
// :: framer then promotes it to `Check` for the following block, giving
// :: the reuse heuristic (steps 5/8) a chance to fire on the next call.
// :: This promotion policy is this crate's own choice (§9's "Open
// :: question": the original leaves deciding when to attempt reuse to the
// :: caller), not part of the distilled spec.

use crate::compress::{compress_block, decompress_block, DecodeContext, Outcome, RepeatState, TableContext};
use crate::config::{Params, BLOCK_SIZE_MAX};
use crate::error::{HuffError, Result};

const TAG_STORED: u8 = 0;
const TAG_RLE: u8 = 1;
const TAG_HUFFMAN_NEW: u8 = 2;
const TAG_HUFFMAN_REUSE: u8 = 3;

fn write_record(out: &mut Vec<u8>, tag: u8, orig_len: u32, payload: &[u8]) {
    out.push(tag);
    out.extend_from_slice(&orig_len.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
}

/// Compress an entire buffer as a sequence of `block_size_max`-sized
/// blocks, framed so `decode_all` can recover the original bytes.
pub fn compress_all(src: &[u8], params: &Params) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(src.len() / 2 + 64);
    let mut ctx = TableContext::new();

    for chunk in src.chunks(BLOCK_SIZE_MAX) {
        match compress_block(chunk, &mut ctx, params, 0)? {
            Outcome::StoreRaw => write_record(&mut out, TAG_STORED, chunk.len() as u32, chunk),
            Outcome::Rle(b) => write_record(&mut out, TAG_RLE, chunk.len() as u32, &[b]),
            Outcome::Compressed { payload, new_table } => {
                let tag = if new_table {
                    ctx.state = RepeatState::Check;
                    TAG_HUFFMAN_NEW
                } else {
                    TAG_HUFFMAN_REUSE
                };
                write_record(&mut out, tag, chunk.len() as u32, &payload);
            }
        }
    }
    Ok(out)
}

/// Inverse of `compress_all`.
pub fn decode_all(data: &[u8], params: &Params) -> Result<Vec<u8>> {
    let err = || HuffError::generic("truncated or malformed frame");
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut ctx = DecodeContext::new();
    let mut pos = 0usize;

    while pos < data.len() {
        let tag = *data.get(pos).ok_or_else(err)?;
        let orig_len_bytes = data.get(pos + 1..pos + 5).ok_or_else(err)?;
        let orig_len = u32::from_le_bytes(orig_len_bytes.try_into().unwrap()) as usize;
        let payload_len_bytes = data.get(pos + 5..pos + 9).ok_or_else(err)?;
        let payload_len = u32::from_le_bytes(payload_len_bytes.try_into().unwrap()) as usize;
        pos += 9;

        let payload = data.get(pos..pos + payload_len).ok_or_else(err)?;
        pos += payload_len;

        match tag {
            TAG_STORED => out.extend_from_slice(payload),
            TAG_RLE => {
                let b = *payload.first().ok_or_else(err)?;
                out.extend(std::iter::repeat(b).take(orig_len));
            }
            TAG_HUFFMAN_NEW | TAG_HUFFMAN_REUSE => {
                let decoded = decompress_block(payload, orig_len, tag == TAG_HUFFMAN_NEW, params.single_stream, &mut ctx)?;
                out.extend(decoded);
            }
            _ => return Err(err()),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_mixed_content_across_many_blocks() {
        let mut src = Vec::new();
        src.extend(vec![b'x'; 5_000]); // RLE block
        src.extend(b"ABAB".iter().cycle().take(3_000)); // stored (too flat / small)
        let mut zipf = Vec::with_capacity(40_000);
        for i in 0..40_000u32 {
            zipf.push(((i as f64).sqrt() as u32 % 40) as u8);
        }
        src.extend(zipf);

        let params = Params::default().with_prefer_repeat(true);
        let framed = compress_all(&src, &params).unwrap();
        let decoded = decode_all(&framed, &params).unwrap();
        assert_eq!(decoded, src);
    }

    #[test]
    fn roundtrips_empty_input() {
        let params = Params::default();
        let framed = compress_all(&[], &params).unwrap();
        assert!(framed.is_empty());
        let decoded = decode_all(&framed, &params).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn roundtrips_a_single_large_block_spanning_two_chunks() {
        let mut src = Vec::with_capacity(200_000);
        for i in 0..200_000u32 {
            src.push(((i * 2654435761) % 53) as u8);
        }
        let params = Params::default();
        let framed = compress_all(&src, &params).unwrap();
        let decoded = decode_all(&framed, &params).unwrap();
        assert_eq!(decoded, src);
    }

    #[test]
    fn four_stream_mode_roundtrips() {
        let mut src = Vec::with_capacity(50_000);
        for i in 0..50_000u32 {
            src.push(((i * 40503) % 29) as u8);
        }
        let params = Params::four_stream();
        let framed = compress_all(&src, &params).unwrap();
        let decoded = decode_all(&framed, &params).unwrap();
        assert_eq!(decoded, src);
    }
}
