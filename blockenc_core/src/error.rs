//! Error types for block encoding and record replay.

use thiserror::Error;

/// Errors raised while sizing, encoding or replaying a block.
///
/// Encode-side failures abort the whole call: no entry is appended to the
/// field record and the caller's cursor is left where it was.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The output buffer cannot hold the worst-case size for this call.
    #[error("capacity violation: {needed} bytes needed but only {available} available")]
    CapacityViolation { needed: usize, available: usize },
    /// A codec wrote more bytes than the capacity it was handed.
    #[error("codec {codec} wrote {written} bytes into a region of {capacity} bytes")]
    CodecContractViolation {
        codec: &'static str,
        written: usize,
        capacity: usize,
    },
    /// A codec reported one size but advanced the cursor by another.
    #[error("codec {codec} reported {expected} bytes but advanced the cursor by {actual}")]
    CursorMismatch {
        codec: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Shape buffer and value buffer disagree.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    /// Block constructor used with the wrong dimensionality.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// Element or byte counts overflow `usize`.
    #[error("size overflow while reducing shapes")]
    SizeOverflow,
    /// A size does not fit the 32-bit wire fields of an entry.
    #[error("block too large: {0} bytes does not fit a u32 size field")]
    BlockTooLarge(usize),
    /// Underlying compression library failed.
    #[error("{codec} codec error: {message}")]
    Codec {
        codec: &'static str,
        message: String,
    },
    /// Stored bytes do not hash to the recorded value.
    #[error("hash mismatch: expected {expected:016x}, got {actual:016x}")]
    HashMismatch { expected: u64, actual: u64 },
    /// Entry was written by a different codec version.
    #[error("encoder version mismatch: entry has {found}, codec is {expected}")]
    VersionMismatch { expected: u32, found: u32 },
    /// Entry was written by a different codec.
    #[error("codec mismatch: entry uses codec {found} but provided codec has id {expected}")]
    CodecMismatch { expected: u16, found: u16 },
    /// Byte stream ends before the record says it should.
    #[error("truncated input: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    /// Decompressed size differs from the recorded input size.
    #[error("decompressed to {actual} bytes but entry says {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    /// Requested call index is past the end of the record.
    #[error("block index {index} out of range (total {count})")]
    BlockIndexOutOfRange { index: usize, count: usize },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EncodeError>;

impl EncodeError {
    /// Wrap a compression library error.
    pub fn codec(codec: &'static str, err: impl std::fmt::Display) -> Self {
        EncodeError::Codec {
            codec,
            message: err.to_string(),
        }
    }
}
