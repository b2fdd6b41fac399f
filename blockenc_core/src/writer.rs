use std::marker::PhantomData;

use tracing::debug;

use crate::block::Block;
use crate::buffer::Buffer;
use crate::codec::BlockCodec;
use crate::encoder::GenericBlockEncoder;
use crate::error::{EncodeError, Result};
use crate::field::EncodedField;
use crate::shape::{ShapeEncoding, ShapeEncodingFromBlock};
use crate::types::TypeDescriptor;

/// Accumulates the encoded form of one logical field, chunk by chunk.
///
/// # Write contract
/// Call [`append`](Self::append) once per chunk, in the order the decoder
/// will replay them. Each call:
/// 1. asks the encoder for the chunk's worst-case compressed size,
/// 2. grows the buffer so that many bytes are addressable past the cursor,
/// 3. encodes the chunk and advances the cursor.
///
/// Call [`finish`](Self::finish) to take the field record and exactly the
/// bytes written.
///
/// # Layout written
/// ```text
/// [call 0: shapes?][call 0: values][call 1: shapes?][call 1: values] ...
/// ```
pub struct FieldWriter<TD, C: BlockCodec, SE = ShapeEncodingFromBlock<C>> {
    opts: C::Opts,
    field: EncodedField,
    buffer: Buffer,
    /// Current write position in the buffer.
    pos: usize,
    _marker: PhantomData<fn() -> (TD, SE)>,
}

impl<TD, C, SE> FieldWriter<TD, C, SE>
where
    TD: TypeDescriptor,
    C: BlockCodec,
    SE: ShapeEncoding,
{
    pub fn new(opts: C::Opts) -> Self {
        Self::with_buffer(opts, Buffer::new())
    }

    /// Write into a caller-supplied buffer, e.g. one built with
    /// [`Buffer::with_max_size`].
    pub fn with_buffer(opts: C::Opts, buffer: Buffer) -> Self {
        Self {
            opts,
            field: EncodedField::new(),
            buffer,
            pos: 0,
            _marker: PhantomData,
        }
    }

    /// Encode one chunk. Returns the number of bytes it occupies.
    pub fn append(&mut self, block: &Block<'_, TD>) -> Result<usize> {
        let max = GenericBlockEncoder::<TD, C, SE>::max_compressed_size(block)?;
        let needed = self.pos.checked_add(max).ok_or(EncodeError::SizeOverflow)?;
        self.buffer.assert_capacity(needed)?;

        let start = self.pos;
        GenericBlockEncoder::<TD, C, SE>::encode(
            &self.opts,
            block,
            &mut self.field,
            &mut self.buffer,
            &mut self.pos,
        )?;
        let written = self.pos - start;
        debug!(
            codec = C::NAME,
            rows = block.row_count(),
            bound = max,
            written,
            "appended block {}",
            self.field.block_count() - 1
        );
        Ok(written)
    }

    pub fn field(&self) -> &EncodedField {
        &self.field
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer.as_slice()[..self.pos]
    }

    /// Seal the field: returns the record and the encoded bytes.
    pub fn finish(self) -> (EncodedField, Vec<u8>) {
        debug!(
            blocks = self.field.block_count(),
            items = self.field.items_count(),
            bytes = self.pos,
            "field finished"
        );
        (self.field, self.buffer.into_written(self.pos))
    }
}
