use std::marker::PhantomData;

use tracing::trace;

use crate::block::Block;
use crate::buffer::Buffer;
use crate::codec::BlockCodec;
use crate::error::{EncodeError, Result};
use crate::field::{wire_size, CodecParams, EncodedBlock, EncodedField};
use crate::hash::HashAccum;
use crate::shape::{ShapeEncoding, ShapeEncodingFromBlock};
use crate::size::{nd_array_block, scalar_block, BlockSize, NdArraySizes};
use crate::types::{DimensionTag, ElementType, TypeDescriptor};

/// Encodes one logical block (scalar or N-dimensional) into compressed bytes
/// plus an entry in an [`EncodedField`].
///
/// - `TD` fixes the element type and dimensionality.
/// - `C` compresses the value run.
/// - `SE` compresses the shape run; by default `C` running with its shape defaults.
///
/// The type is never instantiated: every call is an independent invocation
/// with no state carried between calls. Encoding the same block into the
/// same buffer state at the same cursor always yields the same bytes and
/// the same entry.
pub struct GenericBlockEncoder<TD, C, SE> {
    _marker: PhantomData<fn() -> (TD, C, SE)>,
}

/// Block encoder that reuses the value codec for shapes.
pub type BlockEncoder<TD, C> = GenericBlockEncoder<TD, C, ShapeEncodingFromBlock<C>>;

enum Sizes {
    Scalar(BlockSize),
    NdArray(NdArraySizes),
}

impl<TD, C, SE> GenericBlockEncoder<TD, C, SE>
where
    TD: TypeDescriptor,
    C: BlockCodec,
    SE: ShapeEncoding,
{
    fn sizes(block: &Block<'_, TD>) -> Result<Sizes> {
        let rows = block.row_count();
        let stride = <TD::Dim as DimensionTag>::STRIDE;
        if stride == 0 {
            let values = scalar_block::<TD::Elem>(rows)?;
            wire_size(values.bytes)?;
            wire_size(C::max_compressed_size(values.bytes))?;
            Ok(Sizes::Scalar(values))
        } else {
            let sizes = nd_array_block::<TD::Elem>(rows, stride, block.shapes())?;
            wire_size(sizes.shapes.bytes)?;
            wire_size(sizes.values.bytes)?;
            wire_size(SE::max_compressed_size(sizes.shapes.bytes))?;
            wire_size(C::max_compressed_size(sizes.values.bytes))?;
            Ok(Sizes::NdArray(sizes))
        }
    }

    /// Worst-case number of bytes `encode` may write for `block`.
    ///
    /// Callers reserve this many bytes past their cursor before encoding.
    pub fn max_compressed_size(block: &Block<'_, TD>) -> Result<usize> {
        match Self::sizes(block)? {
            Sizes::Scalar(values) => {
                let compressed = C::max_compressed_size(values.bytes);
                trace!("Scalar block has {} bytes", compressed);
                Ok(compressed)
            }
            Sizes::NdArray(sizes) => {
                let comp_data = C::max_compressed_size(sizes.values.bytes);
                let comp_shapes = SE::max_compressed_size(sizes.shapes.bytes);
                let total = comp_data
                    .checked_add(comp_shapes)
                    .ok_or(EncodeError::SizeOverflow)?;
                trace!(
                    "Array block has {} bytes ({} + {})",
                    total,
                    comp_shapes,
                    comp_data
                );
                Ok(total)
            }
        }
    }

    /// Encode `block` at `*pos` in `out` and append its entries to `field`.
    ///
    /// Capacity for the worst case is asserted before anything is written.
    /// On error neither `field` nor `*pos` change; bytes already written past
    /// `*pos` are garbage the caller may overwrite.
    pub fn encode(
        opts: &C::Opts,
        block: &Block<'_, TD>,
        field: &mut EncodedField,
        out: &mut Buffer,
        pos: &mut usize,
    ) -> Result<()> {
        let mut hasher = HashAccum::seeded();
        let rows = block.row_count();
        let mut cursor = *pos;

        match Self::sizes(block)? {
            Sizes::Scalar(values) => {
                trace!(
                    "Generic block encode writing scalar of {} {} elements",
                    rows,
                    <TD::Elem as ElementType>::DATA_TYPE
                );
                let comp_data = C::max_compressed_size(values.bytes);
                ensure_buffer(out, cursor, comp_data)?;

                let mut params = CodecParams::default();
                let written = Self::encode_values(
                    opts,
                    block,
                    &values,
                    &mut hasher,
                    out,
                    comp_data,
                    &mut cursor,
                    &mut params,
                )?;
                let entry =
                    EncodedBlock::new(&values, written, hasher.digest(), C::VERSION, params)?;
                field.add_scalar_block(rows, entry);
            }
            Sizes::NdArray(sizes) => {
                trace!(
                    "Generic block encoder writing ndarray field of {} items",
                    sizes.item_count
                );
                let comp_data = C::max_compressed_size(sizes.values.bytes);
                let comp_shapes = SE::max_compressed_size(sizes.shapes.bytes);
                let total = comp_data
                    .checked_add(comp_shapes)
                    .ok_or(EncodeError::SizeOverflow)?;
                ensure_buffer(out, cursor, total)?;

                let mut shape_params = CodecParams::default();
                let start = cursor;
                let shape_written = SE::encode_block(
                    block.shapes(),
                    &sizes.shapes,
                    &mut hasher,
                    out.data_mut(),
                    comp_shapes,
                    &mut cursor,
                    &mut shape_params,
                )?;
                check_written(SE::NAME, shape_written, comp_shapes, start, cursor)?;
                let shape_hash = hasher.digest_and_reset();
                let shape_entry = EncodedBlock::new(
                    &sizes.shapes,
                    shape_written,
                    shape_hash,
                    SE::VERSION,
                    shape_params,
                )?;

                let mut value_params = CodecParams::default();
                let values_written = Self::encode_values(
                    opts,
                    block,
                    &sizes.values,
                    &mut hasher,
                    out,
                    comp_data,
                    &mut cursor,
                    &mut value_params,
                )?;
                let value_entry = EncodedBlock::new(
                    &sizes.values,
                    values_written,
                    hasher.digest(),
                    C::VERSION,
                    value_params,
                )?;
                trace!(
                    "Setting encoded bytes: {}:{}",
                    shape_written,
                    values_written
                );
                field.add_ndarray_block(rows, shape_entry, value_entry);
            }
        }

        *pos = cursor;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn encode_values(
        opts: &C::Opts,
        block: &Block<'_, TD>,
        size: &BlockSize,
        hasher: &mut HashAccum,
        out: &mut Buffer,
        capacity: usize,
        cursor: &mut usize,
        params: &mut CodecParams,
    ) -> Result<usize> {
        let start = *cursor;
        let written = C::encode_block(
            opts,
            block.values(),
            size,
            hasher,
            out.data_mut(),
            capacity,
            cursor,
            params,
        )?;
        check_written(C::NAME, written, capacity, start, *cursor)?;
        Ok(written)
    }
}

/// Reserve `bytes` past `pos`.
fn ensure_buffer(out: &mut Buffer, pos: usize, bytes: usize) -> Result<()> {
    let needed = pos.checked_add(bytes).ok_or(EncodeError::SizeOverflow)?;
    out.assert_capacity(needed)
}

fn check_written(
    codec: &'static str,
    written: usize,
    capacity: usize,
    start: usize,
    cursor: usize,
) -> Result<()> {
    if written > capacity {
        return Err(EncodeError::CodecContractViolation {
            codec,
            written,
            capacity,
        });
    }
    let advanced = cursor.wrapping_sub(start);
    if cursor < start || advanced != written {
        return Err(EncodeError::CursorMismatch {
            codec,
            expected: written,
            actual: advanced,
        });
    }
    Ok(())
}
