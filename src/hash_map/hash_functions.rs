//! Seeded hash functions for producing [`HashIndex`](super::HashIndex) keys
//!
//! The index itself treats hashes as opaque `u64` values. These helpers
//! implement MurmurHash64A with an explicit seed, so hashing is deterministic
//! and independent of any process-wide state.
//!
//! ```rust
//! use primkit::hash_map::{SeededHasher, HashIndex};
//!
//! let hasher = SeededHasher::new(0x5eed);
//! let mut index = HashIndex::new(32);
//! index.set(hasher.index_hash(b"english"), 1).unwrap();
//! assert_eq!(index.get(hasher.index_hash(b"english")), 1);
//! ```

/// MurmurHash64A multiplication constant
pub const MURMUR_M: u64 = 0xC6A4_A793_5BD1_E995;

/// MurmurHash64A shift constant
pub const MURMUR_R: u32 = 47;

/// MurmurHash64A of `data` with the given `seed`
///
/// Eight-byte blocks are read little-endian, so the result is identical
/// across platforms.
pub fn murmur_hash64a(data: &[u8], seed: u64) -> u64 {
    let mut h = seed ^ (data.len() as u64).wrapping_mul(MURMUR_M);

    let mut blocks = data.chunks_exact(8);
    for block in &mut blocks {
        let mut k = u64::from_le_bytes([
            block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7],
        ]);
        k = k.wrapping_mul(MURMUR_M);
        k ^= k >> MURMUR_R;
        k = k.wrapping_mul(MURMUR_M);

        h ^= k;
        h = h.wrapping_mul(MURMUR_M);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        for (i, &byte) in tail.iter().enumerate() {
            h ^= (byte as u64) << (8 * i);
        }
        h = h.wrapping_mul(MURMUR_M);
    }

    h ^= h >> MURMUR_R;
    h = h.wrapping_mul(MURMUR_M);
    h ^= h >> MURMUR_R;
    h
}

/// Hasher carrying an explicit seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeededHasher {
    seed: u64,
}

impl SeededHasher {
    /// Create a hasher with the given seed
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// The seed mixed into every hash
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Raw MurmurHash64A of `data`
    #[inline]
    pub fn hash(&self, data: &[u8]) -> u64 {
        murmur_hash64a(data, self.seed)
    }

    /// Raw MurmurHash64A of a string's UTF-8 bytes
    #[inline]
    pub fn hash_str(&self, s: &str) -> u64 {
        self.hash(s.as_bytes())
    }

    /// Hash usable as a [`HashIndex`](super::HashIndex) key
    ///
    /// A raw result of 0 collides with the empty-bucket marker, so it is
    /// mapped to 1.
    #[inline]
    pub fn index_hash(&self, data: &[u8]) -> u64 {
        match self.hash(data) {
            0 => 1,
            h => h,
        }
    }
}
