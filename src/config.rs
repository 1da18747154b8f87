// =-=-= config.rs =-=-=
// Caller-tunable knobs, and the constants the core is built against.

/// Absolute maximum code length this crate will ever emit.
pub const L_MAX: u8 = 12;

/// Default code length cap used when a caller doesn't ask for a specific one.
pub const L_DEFAULT: u8 = 11;

/// Largest symbol value the core understands (bytes only).
pub const SYMBOL_MAX: usize = 255;

/// Largest block `compress_block` will accept in one call.
///
/// The spec requires this be at least 64 KiB; 128 KiB matches the teacher
/// family's own block-size conventions (bzip2 blocks run 100 KiB-900 KiB,
/// chosen via `level`; this entropy stage runs underneath a similarly
/// block-structured framer, so a single fixed cap rather than a `level`
/// knob is the right shape here).
pub const BLOCK_SIZE_MAX: usize = 128 * 1024;

/// `max_table_log` the FSE sub-coder uses when compressing a weight vector.
pub const FSE_MAX_TABLE_LOG: u8 = 6;

/// Per-block tuning parameters for `compress_block`.
///
/// Mirrors the shape of the teacher's own `level` parameter to `encode()`:
/// a small, caller-supplied knob bundle rather than a global, with sane
/// defaults for the common case.
#[derive(Debug, Clone, Copy)]
pub struct Params {
    /// Maximum codeword length. Clamped to `[1, L_MAX]` by `compress_block`.
    pub max_code_len: u8,
    /// Requested Huffman table log; `None` lets `optimal_table_log` choose.
    pub huff_log: Option<u8>,
    /// If true, and the persisted table's repeat state allows it, reuse the
    /// previous table instead of building a fresh one for this block.
    pub prefer_repeat: bool,
    /// Emit four independent bitstreams instead of one.
    pub single_stream: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_code_len: L_DEFAULT,
            huff_log: None,
            prefer_repeat: false,
            single_stream: true,
        }
    }
}

impl Params {
    /// Start from the defaults with four-stream encoding enabled.
    pub fn four_stream() -> Self {
        Self {
            single_stream: false,
            ..Self::default()
        }
    }

    pub fn with_max_code_len(mut self, len: u8) -> Self {
        self.max_code_len = len;
        self
    }

    pub fn with_huff_log(mut self, log: u8) -> Self {
        self.huff_log = Some(log);
        self
    }

    pub fn with_prefer_repeat(mut self, prefer: bool) -> Self {
        self.prefer_repeat = prefer;
        self
    }
}
