//! Bounded FIFO of key hashes for recently evicted entries.
//!
//! Holds no keys and no node references, only 64-bit hashes produced by a
//! configurable [`BuildHasher`]. Membership is O(1) through a side set.
//!
//! ## Architecture
//!
//! ```text
//!   set: FxHashSet<u64>          queue: VecDeque<u64>
//!   ┌──────────┐                 front ─► [h1] [h2] [h3] ◄── back
//!   │ h1 h2 h3 │                 oldest                 newest
//!   └──────────┘
//! ```
//!
//! ## Behavior
//! - `record(h, max_len)`: appends `h` unless already present, first
//!   dropping the oldest hashes until fewer than `max_len` remain
//! - `contains_hash(h)`: membership test; never consumes the entry
//! - `clear()`: resets both queue and set
//!
//! The bound is supplied per call because it tracks the live cache's
//! current entry count rather than a fixed capacity.
//!
//! `debug_validate_invariants()` is available in debug/test builds.
use std::collections::VecDeque;
use std::hash::{BuildHasher, Hash};

use rustc_hash::{FxBuildHasher, FxHashSet};

#[derive(Debug, Clone)]
/// FIFO of key hashes with O(1) membership.
pub struct GhostList<S = FxBuildHasher> {
    queue: VecDeque<u64>,
    set: FxHashSet<u64>,
    hasher: S,
}

impl GhostList<FxBuildHasher> {
    /// Creates an empty ghost list hashing keys with `FxHasher`.
    pub fn new() -> Self {
        Self::with_hasher(FxBuildHasher)
    }
}

impl Default for GhostList<FxBuildHasher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> GhostList<S> {
    #[inline]
    pub fn contains_hash(&self, hash: u64) -> bool {
        self.set.contains(&hash)
    }

    /// Number of recorded hashes.
    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Clears all recorded hashes.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.set.clear();
    }

    /// Returns `true` if the FIFO and the membership set hold the same hashes.
    pub fn is_consistent(&self) -> bool {
        self.queue.len() == self.set.len() && self.queue.iter().all(|h| self.set.contains(h))
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.queue.len(), self.set.len());
        for hash in &self.queue {
            assert!(self.set.contains(hash));
        }
    }
}

impl<S: BuildHasher> GhostList<S> {
    /// Creates an empty ghost list using `hasher` for key hashes.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            queue: VecDeque::new(),
            set: FxHashSet::default(),
            hasher,
        }
    }

    /// Hashes `key` the way this list records it.
    #[inline]
    pub fn hash_key<K: Hash + ?Sized>(&self, key: &K) -> u64 {
        self.hasher.hash_one(key)
    }

    /// Returns `true` if the hash of `key` is recorded.
    #[inline]
    pub fn contains<K: Hash + ?Sized>(&self, key: &K) -> bool {
        self.contains_hash(self.hash_key(key))
    }

    /// Records `hash`, trimming the oldest entries so the list stays below
    /// `max_len` before the push. Returns `true` if the hash was added.
    ///
    /// Duplicates are ignored, and nothing is recorded when `max_len` is 0.
    pub fn record(&mut self, hash: u64, max_len: usize) -> bool {
        if self.set.contains(&hash) || max_len == 0 {
            return false;
        }

        while self.queue.len() >= max_len {
            match self.queue.pop_front() {
                Some(old) => {
                    self.set.remove(&old);
                },
                None => break,
            }
        }

        self.queue.push_back(hash);
        self.set.insert(hash);
        true
    }
}
