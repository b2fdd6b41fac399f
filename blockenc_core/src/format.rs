/// Seed shared by every hash accumulator, on both the encode and replay side.
pub const HASH_SEED: u64 = 0x42;

/// Element type of shape arrays.
pub type Shape = u64;

// ── Codec IDs ──────────────────────────────────────────────────────────────

pub const CODEC_PASSTHROUGH: u16 = 0;
pub const CODEC_ZSTD: u16 = 1;
pub const CODEC_LZ4: u16 = 2;

// ── Codec wire versions ────────────────────────────────────────────────────
//
// Stored in every entry so a decoder can pick the matching inverse routine.

pub const PASSTHROUGH_VERSION: u32 = 1;
pub const ZSTD_VERSION: u32 = 1;
pub const LZ4_VERSION: u32 = 1;

/// Largest size representable in an entry's `input_bytes`/`output_bytes`.
pub const MAX_ENTRY_BYTES: usize = u32::MAX as usize;
