//! Hash-keyed lookup structures
//!
//! - `HashIndex`: open-addressing table from precomputed 64-bit hashes to
//!   64-bit payloads, with backward-shift deletion
//! - `SeededHasher` / `murmur_hash64a`: seeded MurmurHash64A for producing keys

mod hash_functions;
mod hash_index;

pub use hash_index::{ABSENT_PAYLOAD, Bucket, EMPTY_HASH, HashIndex};

// Export hash function utilities
pub use hash_functions::{MURMUR_M, MURMUR_R, SeededHasher, murmur_hash64a};
