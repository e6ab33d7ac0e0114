//! # Primkit: Systems Primitives
//!
//! This crate provides three small building blocks for systems code:
//!
//! ## Key Features
//!
//! - **GrowableArray**: contiguous array grown through `realloc`, with
//!   explicit capacity bookkeeping and bulk append
//! - **HashIndex**: open-addressing table from precomputed 64-bit hashes to
//!   64-bit payloads, using linear probing and backward-shift deletion
//! - **WorkerPool**: fixed set of OS threads consuming closures from a shared
//!   FIFO queue, with idle waiting and graceful shutdown
//! - **Configuration**: validated, environment-driven and JSON-persistable
//!   settings for the hash index and the worker pool
//!
//! ## Quick Start
//!
//! ```rust
//! use primkit::{GrowableArray, HashIndex, WorkerPool};
//! use primkit::hash_map::SeededHasher;
//!
//! // Realloc-grown array
//! let mut arr = GrowableArray::new();
//! arr.push(42u32);
//! arr.extend_from_slice(&[1, 2, 3]);
//! assert_eq!(arr.len(), 4);
//!
//! // Hash index keyed by seeded MurmurHash64A
//! let hasher = SeededHasher::new(7);
//! let mut index = HashIndex::new(0);
//! index.set(hasher.index_hash(b"key"), 99).unwrap();
//! assert_eq!(index.get(hasher.index_hash(b"key")), 99);
//!
//! // Worker pool
//! let pool = WorkerPool::new(2);
//! pool.submit(|| println!("hello from a worker")).unwrap();
//! pool.wait_idle();
//! pool.shutdown();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

#[macro_use]
pub mod error_recovery;

pub mod concurrency;
pub mod config;
pub mod containers;
pub mod error;
pub mod hash_map;

// Re-export core types
pub use error::{PrimkitError, Result};

pub use concurrency::{PoolHandle, PoolState, WorkerPool};
pub use config::{Config, HashIndexConfig, WorkerPoolConfig};
pub use containers::GrowableArray;
pub use hash_map::{HashIndex, SeededHasher};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library (currently only logs the version)
pub fn init() {
    log::debug!("Initializing primkit v{}", VERSION);
}
