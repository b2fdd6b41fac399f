use blockenc_core::format::{CODEC_PASSTHROUGH, PASSTHROUGH_VERSION};
use blockenc_core::types::write_le_slice;
use blockenc_core::{
    output_window, BlockCodec, BlockSize, CodecParams, ElementType, EncodeError, HashAccum,
    Result, ShapeDefaults,
};

/// No-op codec: stores values verbatim as little-endian bytes.
///
/// Useful for:
/// - Verifying the field round-trip independently of any compression.
/// - Data that is already compressed, where further compression would expand it.
pub struct PassThroughCodec;

impl BlockCodec for PassThroughCodec {
    const ID: u16 = CODEC_PASSTHROUGH;
    const NAME: &'static str = "passthrough";
    const VERSION: u32 = PASSTHROUGH_VERSION;
    type Opts = ();

    fn max_compressed_size(bytes: usize) -> usize {
        bytes
    }

    fn encode_block<T: ElementType>(
        _opts: &(),
        input: &[T],
        block: &BlockSize,
        hasher: &mut HashAccum,
        out: &mut [u8],
        capacity: usize,
        pos: &mut usize,
        params: &mut CodecParams,
    ) -> Result<usize> {
        debug_assert_eq!(input.len() * T::WIDTH, block.bytes);
        let dst = output_window(out, *pos, capacity)?;
        let dst = dst
            .get_mut(..block.bytes)
            .ok_or(EncodeError::CodecContractViolation {
                codec: Self::NAME,
                written: block.bytes,
                capacity,
            })?;
        // copy and hash in one pass over the output
        write_le_slice(input, dst);
        hasher.update(dst);
        *params = CodecParams::PassThrough;
        *pos += block.bytes;
        Ok(block.bytes)
    }

    fn decompress_block(_params: &CodecParams, compressed: &[u8], _raw_len: usize) -> Result<Vec<u8>> {
        Ok(compressed.to_vec())
    }
}

impl ShapeDefaults for PassThroughCodec {
    fn set_shape_defaults(_opts: &mut ()) {}
}
