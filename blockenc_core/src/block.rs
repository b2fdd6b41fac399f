use std::fmt;

use crate::error::{EncodeError, Result};
use crate::format::Shape;
use crate::size::values_count;
use crate::types::{DimensionTag, ElementType, TypeDescriptor};

/// One in-memory chunk of a column: a run of rows, with per-row shape
/// vectors when the dimensionality is non-zero.
///
/// Borrowed from the caller; the encoder only reads it. The constructors
/// check that the value buffer holds exactly as many elements as the shape
/// buffer describes.
pub struct Block<'a, TD: TypeDescriptor> {
    row_count: usize,
    shapes: &'a [Shape],
    values: &'a [TD::Elem],
}

impl<'a, TD: TypeDescriptor> Block<'a, TD> {
    /// Scalar run: one value per row.
    pub fn scalar(values: &'a [TD::Elem]) -> Result<Self> {
        let stride = <TD::Dim as DimensionTag>::STRIDE;
        if stride != 0 {
            return Err(EncodeError::DimensionMismatch {
                expected: stride,
                actual: 0,
            });
        }
        Ok(Self {
            row_count: values.len(),
            shapes: &[],
            values,
        })
    }

    /// N-dimensional run: `shapes` holds `STRIDE` components per row,
    /// `values` the flattened elements of every row back to back.
    pub fn ndarray(shapes: &'a [Shape], values: &'a [TD::Elem]) -> Result<Self> {
        let stride = <TD::Dim as DimensionTag>::STRIDE;
        if stride == 0 {
            return Err(EncodeError::DimensionMismatch {
                expected: 0,
                actual: 1,
            });
        }
        let expected = values_count(stride, shapes)?;
        if expected != values.len() {
            return Err(EncodeError::ShapeMismatch(format!(
                "shapes describe {} values but {} were supplied",
                expected,
                values.len()
            )));
        }
        Ok(Self {
            row_count: shapes.len() / stride,
            shapes,
            values,
        })
    }

    /// Number of top-level entries.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[inline]
    pub fn shapes(&self) -> &'a [Shape] {
        self.shapes
    }

    #[inline]
    pub fn values(&self) -> &'a [TD::Elem] {
        self.values
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

impl<TD: TypeDescriptor> fmt::Debug for Block<'_, TD> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("data_type", &<TD::Elem as ElementType>::DATA_TYPE)
            .field("dimension", &<TD::Dim as DimensionTag>::STRIDE)
            .field("row_count", &self.row_count)
            .field("shapes", &self.shapes.len())
            .field("values", &self.values.len())
            .finish()
    }
}
