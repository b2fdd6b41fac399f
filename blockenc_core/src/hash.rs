use xxhash_rust::xxh64::Xxh64;

use crate::format::HASH_SEED;

/// Fixed-width hash value stored in every entry.
pub type HashedValue = u64;

/// Seedable streaming hash fed by codecs as they write compressed bytes.
///
/// Wraps xxHash64. Every logical sub-array (shapes, then values) is hashed
/// from a fresh seed so the digests are independent of each other.
#[derive(Clone)]
pub struct HashAccum {
    state: Xxh64,
}

impl HashAccum {
    pub fn new(seed: u64) -> Self {
        Self {
            state: Xxh64::new(seed),
        }
    }

    /// Accumulator seeded with [`HASH_SEED`].
    pub fn seeded() -> Self {
        Self::new(HASH_SEED)
    }

    pub fn reset(&mut self, seed: u64) {
        self.state.reset(seed);
    }

    #[inline]
    pub fn update(&mut self, bytes: &[u8]) {
        self.state.update(bytes);
    }

    pub fn digest(&self) -> HashedValue {
        self.state.digest()
    }

    /// Read the digest, then reseed with [`HASH_SEED`] for the next sub-array.
    pub fn digest_and_reset(&mut self) -> HashedValue {
        let v = self.digest();
        self.reset(HASH_SEED);
        v
    }
}

impl Default for HashAccum {
    fn default() -> Self {
        Self::seeded()
    }
}

/// One-shot seeded hash of `bytes`, identical to feeding them through a fresh accumulator.
pub fn hash_bytes(bytes: &[u8]) -> HashedValue {
    let mut h = HashAccum::seeded();
    h.update(bytes);
    h.digest()
}
