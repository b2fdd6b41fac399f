//! Block size helper: element and byte counts for shape and value runs.
//!
//! The same functions back both `max_compressed_size` and `encode`, so the
//! capacity reserved by the caller always matches what encode computes.

use crate::error::{EncodeError, Result};
use crate::format::Shape;
use crate::types::ElementType;

/// Element and byte count for one flat run (shapes or values).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockSize {
    pub count: usize,
    pub bytes: usize,
}

/// Sizes of an N-dimensional block: its shape run and its value run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NdArraySizes {
    pub item_count: usize,
    pub shapes: BlockSize,
    pub values: BlockSize,
}

/// Sizes of a scalar run of `rows` elements of `T`.
pub fn scalar_block<T: ElementType>(rows: usize) -> Result<BlockSize> {
    let bytes = rows.checked_mul(T::WIDTH).ok_or(EncodeError::SizeOverflow)?;
    Ok(BlockSize { count: rows, bytes })
}

/// Total value count described by a flat shape buffer of the given stride:
/// the product of each entry's components, summed over all entries.
pub fn values_count(stride: usize, shapes: &[Shape]) -> Result<usize> {
    if stride == 0 {
        return Err(EncodeError::DimensionMismatch {
            expected: 1,
            actual: 0,
        });
    }
    if shapes.len() % stride != 0 {
        return Err(EncodeError::ShapeMismatch(format!(
            "shape buffer of {} entries is not a multiple of stride {}",
            shapes.len(),
            stride
        )));
    }
    shapes.chunks_exact(stride).try_fold(0usize, |total, entry| {
        let product = entry.iter().try_fold(1usize, |acc, &dim| {
            usize::try_from(dim).ok().and_then(|d| acc.checked_mul(d))
        });
        product
            .and_then(|p| total.checked_add(p))
            .ok_or(EncodeError::SizeOverflow)
    })
}

/// Sizes of `rows` entries of dimensionality `stride`, using the first
/// `stride * rows` values of `shapes`.
pub fn nd_array_block<T: ElementType>(
    rows: usize,
    stride: usize,
    shapes: &[Shape],
) -> Result<NdArraySizes> {
    let shape_count = rows.checked_mul(stride).ok_or(EncodeError::SizeOverflow)?;
    let shapes = shapes.get(..shape_count).ok_or_else(|| {
        EncodeError::ShapeMismatch(format!(
            "{} rows of stride {} need {} shape values, have {}",
            rows,
            stride,
            shape_count,
            shapes.len()
        ))
    })?;
    let total_values = values_count(stride, shapes)?;
    let shape_bytes = shape_count
        .checked_mul(<Shape as ElementType>::WIDTH)
        .ok_or(EncodeError::SizeOverflow)?;
    let value_bytes = total_values
        .checked_mul(T::WIDTH)
        .ok_or(EncodeError::SizeOverflow)?;
    Ok(NdArraySizes {
        item_count: rows,
        shapes: BlockSize {
            count: shape_count,
            bytes: shape_bytes,
        },
        values: BlockSize {
            count: total_values,
            bytes: value_bytes,
        },
    })
}
