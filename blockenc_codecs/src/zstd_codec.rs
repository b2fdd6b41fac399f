use blockenc_core::format::{CODEC_ZSTD, ZSTD_VERSION};
use blockenc_core::types::to_le_bytes;
use blockenc_core::{
    output_window, BlockCodec, BlockSize, CodecParams, ElementType, EncodeError, HashAccum,
    Result, ShapeDefaults,
};

/// Zstandard block codec.
///
/// Each block is compressed independently into the caller's output region
/// at the configured level. The bound is zstd's own `ZSTD_compressBound`.
///
/// Best for: general numeric columns with repetition.
pub struct ZstdCodec;

/// Zstd tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZstdOpts {
    /// Compression level (1 = fast / larger, 22 = slow / smallest, 0 = library default).
    pub level: i32,
}

impl Default for ZstdOpts {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl ZstdOpts {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl BlockCodec for ZstdCodec {
    const ID: u16 = CODEC_ZSTD;
    const NAME: &'static str = "zstd";
    const VERSION: u32 = ZSTD_VERSION;
    type Opts = ZstdOpts;

    fn max_compressed_size(bytes: usize) -> usize {
        zstd::zstd_safe::compress_bound(bytes)
    }

    fn encode_block<T: ElementType>(
        opts: &ZstdOpts,
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
        let written = zstd::bulk::compress_to_buffer(&raw, &mut *dst, opts.level)
            .map_err(|e| EncodeError::codec(Self::NAME, e))?;
        hasher.update(&dst[..written]);
        *params = CodecParams::Zstd { level: opts.level };
        *pos += written;
        Ok(written)
    }

    fn decompress_block(_params: &CodecParams, compressed: &[u8], raw_len: usize) -> Result<Vec<u8>> {
        // The entry carries the exact raw size, so decode straight into a
        // buffer of that capacity.
        zstd::bulk::decompress(compressed, raw_len).map_err(|e| EncodeError::codec(Self::NAME, e))
    }
}

impl ShapeDefaults for ZstdCodec {
    fn set_shape_defaults(opts: &mut ZstdOpts) {
        opts.level = 0;
    }
}
