use std::marker::PhantomData;

use crate::codec::ShapeDefaults;
use crate::error::Result;
use crate::field::CodecParams;
use crate::format::Shape;
use crate::hash::HashAccum;
use crate::size::BlockSize;

/// Capability set the generic encoder needs to encode shape arrays.
pub trait ShapeEncoding: Send + Sync + 'static {
    const ID: u16;
    const NAME: &'static str;
    const VERSION: u32;

    fn max_compressed_size(bytes: usize) -> usize;

    fn encode_block(
        input: &[Shape],
        block: &BlockSize,
        hasher: &mut HashAccum,
        out: &mut [u8],
        capacity: usize,
        pos: &mut usize,
        params: &mut CodecParams,
    ) -> Result<usize>;

    fn decompress_block(params: &CodecParams, compressed: &[u8], raw_len: usize)
        -> Result<Vec<u8>>;
}

/// Turns a value codec into a shape encoding by running it with its shape
/// defaults instead of caller tuning.
///
/// A dedicated shape codec can replace this without touching the encoder.
pub struct ShapeEncodingFromBlock<C>(PhantomData<fn() -> C>);

impl<C: ShapeDefaults> ShapeEncoding for ShapeEncodingFromBlock<C> {
    const ID: u16 = C::ID;
    const NAME: &'static str = C::NAME;
    const VERSION: u32 = C::VERSION;

    fn max_compressed_size(bytes: usize) -> usize {
        C::max_compressed_size(bytes)
    }

    fn encode_block(
        input: &[Shape],
        block: &BlockSize,
        hasher: &mut HashAccum,
        out: &mut [u8],
        capacity: usize,
        pos: &mut usize,
        params: &mut CodecParams,
    ) -> Result<usize> {
        let mut opts = C::Opts::default();
        C::set_shape_defaults(&mut opts);
        C::encode_block(&opts, input, block, hasher, out, capacity, pos, params)
    }

    fn decompress_block(
        params: &CodecParams,
        compressed: &[u8],
        raw_len: usize,
    ) -> Result<Vec<u8>> {
        C::decompress_block(params, compressed, raw_len)
    }
}
