//! A pure Rust length-limited canonical Huffman block coder.
//!
//! This crate is the entropy-coding stage of a general-purpose block
//! compressor: given a byte buffer it builds an optimal prefix code bounded
//! to a maximum codeword length, serializes the code table compactly, and
//! emits the input encoded under that table as one or four bitstream
//! partitions. It does not do any LZ-style matching or modeling of its
//! own -- callers sit it underneath whatever produces the bytes to encode.

mod bitstream;
mod canon;
mod compress;
mod config;
mod decode;
mod error;
mod fse;
mod frame;
mod histogram;
mod limit;
mod node;
mod table;

pub use compress::{compress_block, decompress_block, DecodeContext, Outcome, RepeatState, TableContext};
pub use config::{Params, BLOCK_SIZE_MAX, FSE_MAX_TABLE_LOG, L_DEFAULT, L_MAX, SYMBOL_MAX};
pub use error::{is_error, HuffError, Result};
pub use frame::{compress_all, decode_all};
pub use histogram::{count_histogram, Histogram};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_file_roundtrips_through_the_public_api() {
        let mut src = Vec::with_capacity(100_000);
        for i in 0..100_000u32 {
            src.push(((i as f64 / 37.0).sin().abs() * 255.0) as u8);
        }
        let params = Params::default();
        let compressed = compress_all(&src, &params).unwrap();
        let decoded = decode_all(&compressed, &params).unwrap();
        assert_eq!(decoded, src);
    }
}
