//! Generic block encoding engine for columnar storage.
//!
//! A [`Block`] of typed values (scalar, or N-dimensional with per-row shape
//! vectors) is compressed through a pluggable [`BlockCodec`] by the
//! [`GenericBlockEncoder`], which appends sizes, hash and codec version to an
//! [`EncodedField`] record. The record alone is enough to replay the bytes
//! with a [`FieldReader`].

pub mod block;
pub mod buffer;
pub mod codec;
pub mod encoder;
pub mod error;
pub mod field;
pub mod format;
pub mod hash;
pub mod reader;
pub mod shape;
pub mod size;
pub mod types;
pub mod writer;

pub use block::Block;
pub use buffer::{output_window, Buffer};
pub use codec::{BlockCodec, ShapeDefaults};
pub use encoder::{BlockEncoder, GenericBlockEncoder};
pub use error::{EncodeError, Result};
pub use field::{CodecParams, EncodedBlock, EncodedField};
pub use format::{Shape, HASH_SEED};
pub use hash::{HashAccum, HashedValue};
pub use reader::{DecodedBlock, FieldReader};
pub use shape::{ShapeEncoding, ShapeEncodingFromBlock};
pub use size::{BlockSize, NdArraySizes};
pub use types::{
    DataType, Dim, Dim0, Dim1, Dim2, DimensionTag, ElementType, ScalarTag, TypeDescriptor,
    TypeDescriptorTag,
};
pub use writer::FieldWriter;
