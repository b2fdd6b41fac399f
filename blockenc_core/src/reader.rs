use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::codec::BlockCodec;
use crate::error::{EncodeError, Result};
use crate::field::{CodecParams, EncodedBlock, EncodedField};
use crate::format::Shape;
use crate::hash::hash_bytes;
use crate::shape::{ShapeEncoding, ShapeEncodingFromBlock};
use crate::size::values_count;
use crate::types::{from_le_bytes, DimensionTag, ElementType, TypeDescriptor};

/// Shapes and values recovered from one encode call.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBlock<T> {
    pub shapes: Vec<Shape>,
    pub values: Vec<T>,
}

/// Replays an [`EncodedField`] against its encoded bytes.
///
/// # Open sequence
/// 1. Check the record is consistent with the descriptor's dimensionality
///    (paired shape entries for N-dimensional fields, none for scalars).
/// 2. Compute each call's start offset from the recorded `output_bytes`.
/// 3. Check the byte stream is long enough for every entry.
///
/// # Access pattern
/// [`read_block`](Self::read_block) touches only the bytes of the requested
/// call: it verifies codec, version and hash for each run, decompresses it
/// and checks the size against `input_bytes`. Shape and value hashes are
/// verified independently.
pub struct FieldReader<'a, TD, C, SE = ShapeEncodingFromBlock<C>> {
    field: &'a EncodedField,
    bytes: &'a [u8],
    offsets: Vec<usize>,
    _marker: PhantomData<fn() -> (TD, C, SE)>,
}

impl<'a, TD, C, SE> FieldReader<'a, TD, C, SE>
where
    TD: TypeDescriptor,
    C: BlockCodec,
    SE: ShapeEncoding,
{
    pub fn open(field: &'a EncodedField, bytes: &'a [u8]) -> Result<Self> {
        let stride = <TD::Dim as DimensionTag>::STRIDE;
        let expected_shapes = if stride == 0 { 0 } else { field.values().len() };
        if field.shapes().len() != expected_shapes {
            return Err(EncodeError::ShapeMismatch(format!(
                "dimension {} field with {} value entries has {} shape entries",
                stride,
                field.values().len(),
                field.shapes().len()
            )));
        }

        let mut offsets = Vec::with_capacity(field.block_count());
        let mut offset = 0usize;
        for idx in 0..field.block_count() {
            offsets.push(offset);
            if let Some(shape) = field.shapes().get(idx) {
                offset += shape.output_bytes as usize;
            }
            offset += field.values()[idx].output_bytes as usize;
        }
        if offset > bytes.len() {
            return Err(EncodeError::Truncated {
                needed: offset,
                available: bytes.len(),
            });
        }
        debug!(
            blocks = offsets.len(),
            items = field.items_count(),
            bytes = offset,
            "opened field"
        );

        Ok(Self {
            field,
            bytes,
            offsets,
            _marker: PhantomData,
        })
    }

    /// Number of encode calls in the field.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.offsets.len()
    }

    #[inline]
    pub fn items_count(&self) -> u64 {
        self.field.items_count()
    }

    pub fn raw_size(&self) -> u64 {
        self.field.raw_size()
    }

    pub fn compressed_size(&self) -> u64 {
        self.field.compressed_size()
    }

    /// Compression ratio (raw / compressed).
    pub fn ratio(&self) -> f64 {
        let compressed = self.compressed_size();
        if compressed == 0 {
            return 1.0;
        }
        self.raw_size() as f64 / compressed as f64
    }

    /// Decode call `idx`.
    pub fn read_block(&self, idx: usize) -> Result<DecodedBlock<TD::Elem>> {
        let start = *self
            .offsets
            .get(idx)
            .ok_or(EncodeError::BlockIndexOutOfRange {
                index: idx,
                count: self.offsets.len(),
            })?;
        let stride = <TD::Dim as DimensionTag>::STRIDE;
        let mut cursor = start;

        let shapes = match self.field.shapes().get(idx) {
            Some(entry) => {
                let raw = self.read_entry(
                    entry,
                    &mut cursor,
                    SE::ID,
                    SE::VERSION,
                    SE::decompress_block,
                )?;
                from_le_bytes::<Shape>(&raw)?
            }
            None => Vec::new(),
        };

        let entry = &self.field.values()[idx];
        let raw = self.read_entry(entry, &mut cursor, C::ID, C::VERSION, C::decompress_block)?;
        let values = from_le_bytes::<TD::Elem>(&raw)?;

        if stride > 0 {
            let expected = values_count(stride, &shapes)?;
            if expected != values.len() {
                return Err(EncodeError::ShapeMismatch(format!(
                    "block {} shapes describe {} values but {} were decoded",
                    idx,
                    expected,
                    values.len()
                )));
            }
        }
        trace!(
            "read block {}: {} shapes, {} {} values",
            idx,
            shapes.len(),
            values.len(),
            <TD::Elem as ElementType>::DATA_TYPE
        );
        Ok(DecodedBlock { shapes, values })
    }

    /// Decode every call and concatenate the results in call order.
    pub fn read_all(&self) -> Result<DecodedBlock<TD::Elem>> {
        let mut all = DecodedBlock {
            shapes: Vec::new(),
            values: Vec::new(),
        };
        for idx in 0..self.block_count() {
            let block = self.read_block(idx)?;
            all.shapes.extend(block.shapes);
            all.values.extend(block.values);
        }
        Ok(all)
    }

    fn read_entry(
        &self,
        entry: &EncodedBlock,
        cursor: &mut usize,
        codec_id: u16,
        version: u32,
        decompress: fn(&CodecParams, &[u8], usize) -> Result<Vec<u8>>,
    ) -> Result<Vec<u8>> {
        if entry.codec.codec_id() != codec_id {
            return Err(EncodeError::CodecMismatch {
                expected: codec_id,
                found: entry.codec.codec_id(),
            });
        }
        if entry.encoder_version != version {
            return Err(EncodeError::VersionMismatch {
                expected: version,
                found: entry.encoder_version,
            });
        }

        let end = *cursor + entry.output_bytes as usize;
        let compressed = self
            .bytes
            .get(*cursor..end)
            .ok_or(EncodeError::Truncated {
                needed: end,
                available: self.bytes.len(),
            })?;
        *cursor = end;

        let actual = hash_bytes(compressed);
        if actual != entry.hash {
            return Err(EncodeError::HashMismatch {
                expected: entry.hash,
                actual,
            });
        }

        let raw_len = entry.input_bytes as usize;
        if raw_len == 0 {
            return Ok(Vec::new());
        }
        let raw = decompress(&entry.codec, compressed, raw_len)?;
        if raw.len() != raw_len {
            return Err(EncodeError::LengthMismatch {
                expected: raw_len,
                actual: raw.len(),
            });
        }
        Ok(raw)
    }
}
