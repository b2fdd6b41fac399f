//! Static type/dimension descriptors.
//!
//! Every encoder, size computation and reader is parameterized by a
//! [`TypeDescriptor`]: an element type paired with a dimensionality tag.
//! Both are resolved at compile time, so one generic implementation serves
//! every combination.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::error::{EncodeError, Result};

/// Runtime tag for an element type, used in logs and manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl DataType {
    /// Size of one element in bytes.
    pub fn width(self) -> usize {
        match self {
            DataType::U8 | DataType::I8 => 1,
            DataType::U16 | DataType::I16 => 2,
            DataType::U32 | DataType::I32 | DataType::F32 => 4,
            DataType::U64 | DataType::I64 | DataType::F64 => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::U8 => "u8",
            DataType::U16 => "u16",
            DataType::U32 => "u32",
            DataType::U64 => "u64",
            DataType::I8 => "i8",
            DataType::I16 => "i16",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
        }
    }

    /// Parse a type name as printed by [`DataType::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        let dt = match name {
            "u8" => DataType::U8,
            "u16" => DataType::U16,
            "u32" => DataType::U32,
            "u64" => DataType::U64,
            "i8" => DataType::I8,
            "i16" => DataType::I16,
            "i32" => DataType::I32,
            "i64" => DataType::I64,
            "f32" => DataType::F32,
            "f64" => DataType::F64,
            _ => return None,
        };
        Some(dt)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fixed-width element stored little-endian on the wire.
pub trait ElementType: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    const DATA_TYPE: DataType;
    const WIDTH: usize;

    /// Write `self` into `out`, which is exactly `WIDTH` bytes long.
    fn write_le(self, out: &mut [u8]);

    /// Read a value from exactly `WIDTH` bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_element_type {
    ($($t:ty => $dt:ident),* $(,)?) => {
        $(
            impl ElementType for $t {
                const DATA_TYPE: DataType = DataType::$dt;
                const WIDTH: usize = std::mem::size_of::<$t>();

                #[inline]
                fn write_le(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(bytes);
                    <$t>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_element_type! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}

/// Serialize `values` into `out`. `out.len()` must equal `values.len() * T::WIDTH`.
pub fn write_le_slice<T: ElementType>(values: &[T], out: &mut [u8]) {
    for (chunk, v) in out.chunks_exact_mut(T::WIDTH).zip(values) {
        v.write_le(chunk);
    }
}

/// Serialize `values` into a fresh little-endian byte vector.
pub fn to_le_bytes<T: ElementType>(values: &[T]) -> Vec<u8> {
    let mut out = vec![0u8; values.len() * T::WIDTH];
    write_le_slice(values, &mut out);
    out
}

/// Rebuild typed values from little-endian bytes.
pub fn from_le_bytes<T: ElementType>(bytes: &[u8]) -> Result<Vec<T>> {
    if bytes.len() % T::WIDTH != 0 {
        return Err(EncodeError::LengthMismatch {
            expected: bytes.len() / T::WIDTH * T::WIDTH,
            actual: bytes.len(),
        });
    }
    Ok(bytes.chunks_exact(T::WIDTH).map(T::read_le).collect())
}

/// Dimensionality tag: how many shape components each entry carries.
pub trait DimensionTag: Send + Sync + 'static {
    /// Shape-vector stride. Zero means scalar (no shape array at all).
    const STRIDE: usize;
}

/// Dimensionality `N`. `Dim<0>` is a scalar run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dim<const N: usize>;

impl<const N: usize> DimensionTag for Dim<N> {
    const STRIDE: usize = N;
}

pub type Dim0 = Dim<0>;
pub type Dim1 = Dim<1>;
pub type Dim2 = Dim<2>;

/// Compile-time pairing of an element type and a dimensionality.
pub trait TypeDescriptor: Send + Sync + 'static {
    type Elem: ElementType;
    type Dim: DimensionTag;

    fn data_type() -> DataType {
        <Self::Elem as ElementType>::DATA_TYPE
    }

    fn dimension() -> usize {
        <Self::Dim as DimensionTag>::STRIDE
    }
}

/// Zero-sized [`TypeDescriptor`] for `T` with dimensionality `D`.
pub struct TypeDescriptorTag<T, D>(PhantomData<fn() -> (T, D)>);

impl<T: ElementType, D: DimensionTag> TypeDescriptor for TypeDescriptorTag<T, D> {
    type Elem = T;
    type Dim = D;
}

/// Scalar column of `T`.
pub type ScalarTag<T> = TypeDescriptorTag<T, Dim0>;
