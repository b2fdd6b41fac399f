mod lz4_codec;
mod passthrough;
mod zstd_codec;

pub use lz4_codec::{Lz4Codec, Lz4Opts};
pub use passthrough::PassThroughCodec;
pub use zstd_codec::{ZstdCodec, ZstdOpts};

use blockenc_core::format::{CODEC_LZ4, CODEC_PASSTHROUGH, CODEC_ZSTD};

/// Resolve a bundled codec's name from its stored codec id.
///
/// Codecs are dispatched statically, so callers holding only an id (e.g.
/// from a persisted record) match on it to pick the concrete codec type.
pub fn codec_name(id: u16) -> Option<&'static str> {
    match id {
        CODEC_PASSTHROUGH => Some("passthrough"),
        CODEC_ZSTD => Some("zstd"),
        CODEC_LZ4 => Some("lz4"),
        _ => None,
    }
}
