use std::fmt;

use crate::error::Result;
use crate::field::CodecParams;
use crate::hash::HashAccum;
use crate::size::BlockSize;
use crate::types::ElementType;

/// Pluggable block compression algorithm over one flat typed array.
///
/// Implementations are stateless: every associated function is a fresh,
/// independent invocation and all tuning travels in `Opts`.
///
/// Contract for `encode_block`:
/// - write compressed bytes into `out[*pos..*pos + capacity]` and nothing else,
/// - advance `*pos` by exactly the returned byte count,
/// - feed every written byte into `hasher` (the hash is over the compressed
///   stream, since decoders re-hash the stored bytes),
/// - record any tuning the decoder needs into `params`.
///
/// `max_compressed_size(n)` must be a true upper bound for an `n`-byte input;
/// the encoder sizes `capacity` from it.
pub trait BlockCodec: Send + Sync + 'static {
    /// Stable codec ID stored in each entry's codec parameters.
    const ID: u16;

    /// Human-readable codec name for logs and errors.
    const NAME: &'static str;

    /// Wire-format version stored in every entry this codec writes.
    const VERSION: u32;

    /// Codec configuration. `Default` gives the untuned settings.
    type Opts: Default + Clone + fmt::Debug + Send + Sync;

    fn max_compressed_size(bytes: usize) -> usize;

    #[allow(clippy::too_many_arguments)]
    fn encode_block<T: ElementType>(
        opts: &Self::Opts,
        input: &[T],
        block: &BlockSize,
        hasher: &mut HashAccum,
        out: &mut [u8],
        capacity: usize,
        pos: &mut usize,
        params: &mut CodecParams,
    ) -> Result<usize>;

    /// Inverse of `encode_block`: `raw_len` is the entry's `input_bytes`.
    fn decompress_block(params: &CodecParams, compressed: &[u8], raw_len: usize)
        -> Result<Vec<u8>>;
}

/// Codecs that can double as shape encoders supply the options to use for
/// shape arrays, which are small and regular.
pub trait ShapeDefaults: BlockCodec {
    fn set_shape_defaults(opts: &mut Self::Opts);
}
