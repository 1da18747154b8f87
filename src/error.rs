// =-=-= error.rs =-=-=
// Error tags surfaced by the core, and the Result alias used throughout.

use std::fmt;

/// Errors the core can surface.
///
/// `0` and `1` are never routed through this type: they are the
/// "store uncompressed" and "RLE" sentinels described in `compress::compress_block`,
/// and are ordinary `Ok(usize)` return values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HuffError {
    /// A symbol value (or the caller-declared `max_symbol_value`) exceeds 255.
    #[error("max symbol value too large: {0}")]
    MaxSymbolTooLarge(usize),

    /// The requested or inferred table log exceeds `L_max`.
    #[error("table log too large: {0} > {max}", max = crate::config::L_MAX)]
    TableLogTooLarge(u8),

    /// The destination buffer is too small to hold the output.
    #[error("destination buffer too small: need at least {0} bytes")]
    DstTooSmall(usize),

    /// The source block exceeds `block_size_max`.
    #[error("source block too large: {0} bytes > {max} byte cap", max = crate::config::BLOCK_SIZE_MAX)]
    SrcTooLarge(usize),

    /// The caller-provided scratch workspace is smaller than required.
    #[error("workspace too small: need at least {0} bytes")]
    WorkspaceTooSmall(usize),

    /// A malformed or inconsistent encoding that does not fit a more specific tag.
    #[error("malformed input: {0}")]
    Generic(Reason),
}

/// A short, human-readable explanation attached to `HuffError::Generic`.
///
/// Kept as a dedicated newtype (rather than a bare `String`) so that the
/// error variant remains cheap to construct from a `&'static str` literal
/// at every call site, while `Display`/`Debug` still show the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reason(pub &'static str);

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl HuffError {
    /// Shorthand for a `Generic` error carrying a static message.
    pub fn generic(msg: &'static str) -> Self {
        HuffError::Generic(Reason(msg))
    }
}

pub type Result<T> = std::result::Result<T, HuffError>;

/// Mirrors the C-ABI `is_error(code)` classifier from the original interface.
///
/// In this crate errors are a distinct `Result::Err` arm rather than a
/// side-band integer range, so this is just `.is_err()`; kept as a named
/// function because callers porting from the code/size-sentinel convention
/// described in the core's contract will look for it by name.
#[inline]
pub fn is_error<T>(result: &Result<T>) -> bool {
    result.is_err()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_displays_message() {
        let e = HuffError::generic("bad weight header");
        assert_eq!(format!("{}", e), "malformed input: bad weight header");
    }

    #[test]
    fn is_error_classifies() {
        let ok: Result<usize> = Ok(0);
        let err: Result<usize> = Err(HuffError::SrcTooLarge(9999999));
        assert!(!is_error(&ok));
        assert!(is_error(&err));
    }
}
