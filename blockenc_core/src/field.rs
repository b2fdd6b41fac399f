//! Encoded field record: the metadata a decoder replays to reverse encoding.

use serde::{Deserialize, Serialize};

use crate::error::{EncodeError, Result};
use crate::format::{CODEC_LZ4, CODEC_PASSTHROUGH, CODEC_ZSTD, MAX_ENTRY_BYTES};
use crate::hash::HashedValue;
use crate::size::BlockSize;

/// Codec-specific parameters recorded alongside each entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "codec", rename_all = "lowercase")]
pub enum CodecParams {
    #[default]
    PassThrough,
    Zstd {
        level: i32,
    },
    Lz4,
}

impl CodecParams {
    /// ID of the codec that wrote these parameters.
    pub fn codec_id(&self) -> u16 {
        match self {
            CodecParams::PassThrough => CODEC_PASSTHROUGH,
            CodecParams::Zstd { .. } => CODEC_ZSTD,
            CodecParams::Lz4 => CODEC_LZ4,
        }
    }
}

/// One encoded run (shapes or values) written by a single encode call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedBlock {
    pub input_bytes: u32,
    pub output_bytes: u32,
    pub hash: HashedValue,
    pub encoder_version: u32,
    pub codec: CodecParams,
}

impl EncodedBlock {
    pub fn new(
        size: &BlockSize,
        output_bytes: usize,
        hash: HashedValue,
        encoder_version: u32,
        codec: CodecParams,
    ) -> Result<Self> {
        Ok(Self {
            input_bytes: wire_size(size.bytes)?,
            output_bytes: wire_size(output_bytes)?,
            hash,
            encoder_version,
            codec,
        })
    }
}

/// Convert a byte count to the 32-bit wire width.
pub fn wire_size(bytes: usize) -> Result<u32> {
    if bytes > MAX_ENTRY_BYTES {
        return Err(EncodeError::BlockTooLarge(bytes));
    }
    Ok(bytes as u32)
}

/// Append-only record accumulated across encode calls for one logical field.
///
/// `items_count` is the sum of every call's row count. Entries are kept in
/// call order; for N-dimensional fields `shapes[i]` and `values[i]` belong to
/// the same call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedField {
    items_count: u64,
    shapes: Vec<EncodedBlock>,
    values: Vec<EncodedBlock>,
}

impl EncodedField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items_count(&self) -> u64 {
        self.items_count
    }

    pub fn shapes(&self) -> &[EncodedBlock] {
        &self.shapes
    }

    pub fn values(&self) -> &[EncodedBlock] {
        &self.values
    }

    /// Number of encode calls recorded.
    pub fn block_count(&self) -> usize {
        self.values.len()
    }

    /// Commit the result of a scalar encode call.
    pub fn add_scalar_block(&mut self, rows: usize, values: EncodedBlock) {
        self.items_count += rows as u64;
        self.values.push(values);
    }

    /// Commit the result of an N-dimensional encode call. The row count is
    /// added once for the pair.
    pub fn add_ndarray_block(&mut self, rows: usize, shapes: EncodedBlock, values: EncodedBlock) {
        self.items_count += rows as u64;
        self.shapes.push(shapes);
        self.values.push(values);
    }

    /// Sum of `input_bytes` over every entry.
    pub fn raw_size(&self) -> u64 {
        self.entries().map(|e| e.input_bytes as u64).sum()
    }

    /// Sum of `output_bytes` over every entry; the length of the encoded stream.
    pub fn compressed_size(&self) -> u64 {
        self.entries().map(|e| e.output_bytes as u64).sum()
    }

    fn entries(&self) -> impl Iterator<Item = &EncodedBlock> {
        self.shapes.iter().chain(self.values.iter())
    }
}
