//! HashIndex - open-addressing map from a 64-bit hash to a 64-bit payload
//!
//! Buckets live directly in a [`GrowableArray`]; collisions are resolved by
//! linear probing from `hash % capacity`. A bucket whose hash is 0 is empty,
//! which is why 0 can never be stored as a key.
//!
//! Deletion uses backward shifting instead of tombstones: after a bucket is
//! cleared, the entries following it in the same run are moved back into the
//! gap whenever their home slot allows it, so every probe chain stays
//! unbroken. Growth doubles the table and reinserts every live bucket.
//!
//! # Examples
//!
//! ```rust
//! use primkit::HashIndex;
//!
//! let mut index = HashIndex::new(16);
//! index.set(0xfeed, 7).unwrap();
//! assert_eq!(index.get(0xfeed), 7);
//!
//! // Absent keys read as the sentinel 0
//! assert_eq!(index.get(0xbeef), 0);
//!
//! assert!(index.delete(0xfeed));
//! assert!(!index.contains(0xfeed));
//! ```

use crate::config::{Config, HashIndexConfig};
use crate::config::hash_index::DEFAULT_INITIAL_CAPACITY;
use crate::containers::GrowableArray;
use crate::error::{PrimkitError, Result};
use std::fmt;

/// Hash value marking an empty bucket
pub const EMPTY_HASH: u64 = 0;

/// Payload returned by [`HashIndex::get`] for absent keys
pub const ABSENT_PAYLOAD: u64 = 0;

/// A single slot of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bucket {
    /// Key, or [`EMPTY_HASH`] for a free slot
    pub hash: u64,
    /// Value stored under `hash`
    pub payload: u64,
}

impl Bucket {
    #[inline]
    fn is_empty(&self) -> bool {
        self.hash == EMPTY_HASH
    }
}

/// Open-addressing hash index with linear probing
pub struct HashIndex {
    /// Table of `capacity` buckets; the array length is the slot count
    buckets: GrowableArray<Bucket>,
    /// Number of live buckets
    occupied: usize,
    /// Growth threshold as a ratio of `occupied / capacity`
    max_load_factor: f64,
}

impl HashIndex {
    /// Create an index with `initial_capacity` slots (512 when 0 is given)
    pub fn new(initial_capacity: usize) -> Self {
        let capacity = if initial_capacity == 0 {
            DEFAULT_INITIAL_CAPACITY
        } else {
            initial_capacity
        };
        Self {
            buckets: GrowableArray::filled(capacity, Bucket::default()),
            occupied: 0,
            max_load_factor: HashIndexConfig::default().max_load_factor,
        }
    }

    /// Create an index from a validated configuration
    pub fn with_config(config: &HashIndexConfig) -> Result<Self> {
        config.validate()?;
        let mut index = Self::new(config.initial_capacity);
        index.max_load_factor = config.max_load_factor;
        Ok(index)
    }

    /// Number of live keys
    #[inline]
    pub fn len(&self) -> usize {
        self.occupied
    }

    /// Check if no key is stored
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Number of slots in the table
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Current ratio of live keys to slots
    #[inline]
    pub fn load_factor(&self) -> f64 {
        self.occupied as f64 / self.capacity() as f64
    }

    /// Growth threshold in use
    #[inline]
    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    #[inline]
    fn home_slot(hash: u64, capacity: usize) -> usize {
        (hash % capacity as u64) as usize
    }

    /// Slot holding `hash`, if present
    fn find_slot(&self, hash: u64) -> Option<usize> {
        if hash == EMPTY_HASH {
            return None;
        }
        let capacity = self.capacity();
        let mut slot = Self::home_slot(hash, capacity);
        // The load factor bound guarantees an empty bucket, so the walk ends.
        loop {
            let bucket = &self.buckets[slot];
            if bucket.is_empty() {
                return None;
            }
            if bucket.hash == hash {
                return Some(slot);
            }
            slot = (slot + 1) % capacity;
        }
    }

    /// Store `payload` under `hash`, overwriting any previous payload
    ///
    /// Returns [`PrimkitError::ReservedHash`] when `hash` is 0.
    pub fn set(&mut self, hash: u64, payload: u64) -> Result<()> {
        if hash == EMPTY_HASH {
            return Err(PrimkitError::reserved_hash());
        }

        if Self::probe_insert(&mut self.buckets, hash, payload) {
            self.occupied += 1;
            if self.load_factor() > self.max_load_factor {
                self.rehash(self.capacity() * 2);
            }
        }
        Ok(())
    }

    /// Linear-probe insert; returns true when a new bucket was taken
    fn probe_insert(buckets: &mut GrowableArray<Bucket>, hash: u64, payload: u64) -> bool {
        let capacity = buckets.len();
        let mut slot = Self::home_slot(hash, capacity);
        loop {
            let bucket = &mut buckets[slot];
            if bucket.is_empty() {
                *bucket = Bucket { hash, payload };
                return true;
            }
            if bucket.hash == hash {
                bucket.payload = payload;
                return false;
            }
            slot = (slot + 1) % capacity;
        }
    }

    /// Payload stored under `hash`, or [`ABSENT_PAYLOAD`] (0) when absent
    ///
    /// A stored payload of 0 cannot be told apart from absence here; use
    /// [`contains`](Self::contains) when that matters.
    pub fn get(&self, hash: u64) -> u64 {
        match self.find_slot(hash) {
            Some(slot) => self.buckets[slot].payload,
            None => ABSENT_PAYLOAD,
        }
    }

    /// Check whether `hash` is stored
    pub fn contains(&self, hash: u64) -> bool {
        self.find_slot(hash).is_some()
    }

    /// Remove `hash`, returning whether it was present
    pub fn delete(&mut self, hash: u64) -> bool {
        let Some(slot) = self.find_slot(hash) else {
            return false;
        };
        self.backward_shift(slot);
        self.occupied -= 1;
        true
    }

    /// Close the gap at `gap` by pulling back later entries of the same run
    fn backward_shift(&mut self, mut gap: usize) {
        let capacity = self.capacity();
        let mut next = (gap + 1) % capacity;

        loop {
            let bucket = self.buckets[next];
            if bucket.is_empty() {
                break;
            }

            // Probe distances measured back from `next`: the entry may fill
            // the gap only if its home slot is not strictly after the gap.
            let home = Self::home_slot(bucket.hash, capacity);
            let home_distance = (next + capacity - home) % capacity;
            let gap_distance = (next + capacity - gap) % capacity;
            if home_distance >= gap_distance {
                self.buckets[gap] = bucket;
                gap = next;
            }

            next = (next + 1) % capacity;
        }

        self.buckets[gap] = Bucket::default();
    }

    /// Rebuild the table with `new_capacity` slots, reinserting every key
    fn rehash(&mut self, new_capacity: usize) {
        log::debug!(
            "HashIndex: rehashing {} keys from {} to {} slots",
            self.occupied,
            self.capacity(),
            new_capacity
        );

        let mut buckets = GrowableArray::filled(new_capacity, Bucket::default());
        let mut moved = 0;
        for bucket in self.buckets.iter().filter(|b| !b.is_empty()) {
            Self::probe_insert(&mut buckets, bucket.hash, bucket.payload);
            moved += 1;
        }
        crate::primkit_verify!(
            moved == self.occupied,
            "rehash moved {} keys, expected {}",
            moved,
            self.occupied
        );

        self.buckets = buckets;
    }

    /// Remove every key, keeping the current table size
    pub fn clear(&mut self) {
        for bucket in self.buckets.iter_mut() {
            *bucket = Bucket::default();
        }
        self.occupied = 0;
    }

    /// Iterate over live `(hash, payload)` pairs in table order
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.buckets
            .iter()
            .filter(|b| !b.is_empty())
            .map(|b| (b.hash, b.payload))
    }
}

impl Default for HashIndex {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_CAPACITY)
    }
}

impl fmt::Debug for HashIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashIndex")
            .field("len", &self.occupied)
            .field("capacity", &self.capacity())
            .field("max_load_factor", &self.max_load_factor)
            .finish()
    }
}
