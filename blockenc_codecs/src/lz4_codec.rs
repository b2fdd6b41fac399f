use blockenc_core::format::{CODEC_LZ4, LZ4_VERSION};
use blockenc_core::types::to_le_bytes;
use blockenc_core::{
    output_window, BlockCodec, BlockSize, CodecParams, ElementType, EncodeError, HashAccum,
    Result, ShapeDefaults,
};
use lz4_flex::block::{compress_into, decompress, get_maximum_output_size};

/// LZ4 block codec.
///
/// Fastest decompression of the bundled codecs. The raw block is written
/// without a size prefix; the entry's `input_bytes` carries it instead.
///
/// Best for: hot data, low-latency decode.
pub struct Lz4Codec;

/// LZ4 tuning. `lz4_flex` exposes no knobs, so this carries nothing yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lz4Opts;

impl BlockCodec for Lz4Codec {
    const ID: u16 = CODEC_LZ4;
    const NAME: &'static str = "lz4";
    const VERSION: u32 = LZ4_VERSION;
    type Opts = Lz4Opts;

    fn max_compressed_size(bytes: usize) -> usize {
        get_maximum_output_size(bytes)
    }

    fn encode_block<T: ElementType>(
        _opts: &Lz4Opts,
        input: &[T],
        block: &BlockSize,
        hasher: &mut HashAccum,
        out: &mut [u8],
        capacity: usize,
        pos: &mut usize,
        params: &mut CodecParams,
    ) -> Result<usize> {
        let raw = to_le_bytes(input);
        debug_assert_eq!(raw.len(), block.bytes);
        let dst = output_window(out, *pos, capacity)?;
        let written = compress_into(&raw, dst).map_err(|e| EncodeError::codec(Self::NAME, e))?;
        hasher.update(&dst[..written]);
        *params = CodecParams::Lz4;
        *pos += written;
        Ok(written)
    }

    fn decompress_block(_params: &CodecParams, compressed: &[u8], raw_len: usize) -> Result<Vec<u8>> {
        decompress(compressed, raw_len).map_err(|e| EncodeError::codec(Self::NAME, e))
    }
}

impl ShapeDefaults for Lz4Codec {
    fn set_shape_defaults(_opts: &mut Lz4Opts) {}
}
