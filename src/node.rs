//! Node capabilities consumed by the policy.
//!
//! The policy never owns cache entries. It addresses them by [`SlotId`]
//! through a [`NodeStore`] owned by the cache layer, and reads or mutates
//! only the bookkeeping fields exposed by [`Node`]: cost, frequency,
//! liveness, queue membership and the intrusive `prev`/`next` links.
//!
//! ```text
//!   cache layer                         policy
//!   ┌──────────────────────────┐        ┌──────────────────────────┐
//!   │ index: HashMap<K, SlotId>│        │ small: Queue (head/tail) │
//!   │ store: SlotArena<Entry>  │◄──────►│ main:  Queue (head/tail) │
//!   │   ├ key, cost, freq      │ SlotId │ ghost: hashes only       │
//!   │   ├ alive, expired, mark │        └──────────────────────────┘
//!   │   └ prev, next           │
//!   └──────────────────────────┘
//! ```
//!
//! [`Entry`] is a ready-made record implementing [`Node`]; cache layers with
//! their own entry type implement the trait directly.

use std::hash::Hash;

use crate::ds::SlotId;

/// Queue membership of a node.
///
/// A single tag rather than two flags, so a node can never be marked as a
/// member of both Small and Main.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum QueueMark {
    /// Not tracked by the policy.
    #[default]
    Unmarked,
    /// Member of the probationary Small queue.
    Small,
    /// Member of the Main queue.
    Main,
}

/// Bookkeeping view of a cache entry.
pub trait Node {
    /// Key type; only ever hashed by the policy.
    type Key: Hash + ?Sized;

    fn key(&self) -> &Self::Key;

    /// Weight of the entry in budget units.
    fn cost(&self) -> u64;

    fn frequency(&self) -> u8;
    fn increment_frequency(&mut self);
    /// Decrements the frequency, saturating at zero.
    fn decrement_frequency(&mut self);
    fn reset_frequency(&mut self);

    /// `false` once the cache layer has invalidated the entry.
    fn is_alive(&self) -> bool;
    fn has_expired(&self) -> bool;

    fn mark(&self) -> QueueMark;
    fn set_mark(&mut self, mark: QueueMark);

    fn prev(&self) -> Option<SlotId>;
    fn next(&self) -> Option<SlotId>;
    fn set_prev(&mut self, prev: Option<SlotId>);
    fn set_next(&mut self, next: Option<SlotId>);

    #[inline]
    fn is_small(&self) -> bool {
        self.mark() == QueueMark::Small
    }

    #[inline]
    fn is_main(&self) -> bool {
        self.mark() == QueueMark::Main
    }

    #[inline]
    fn mark_small(&mut self) {
        self.set_mark(QueueMark::Small);
    }

    #[inline]
    fn mark_main(&mut self) {
        self.set_mark(QueueMark::Main);
    }

    #[inline]
    fn unmark(&mut self) {
        self.set_mark(QueueMark::Unmarked);
    }
}

/// Storage the policy resolves [`SlotId`] handles against.
///
/// Lookups of handles that no longer resolve return `None`; every policy
/// operation treats such a handle as an absent node.
pub trait NodeStore {
    type Node: Node;

    fn node(&self, id: SlotId) -> Option<&Self::Node>;
    fn node_mut(&mut self, id: SlotId) -> Option<&mut Self::Node>;
}

/// Default node record.
///
/// # Example
///
/// ```
/// use s3fifo::node::{Entry, Node, QueueMark};
///
/// let mut entry = Entry::new("user:42", 3);
/// assert_eq!(entry.cost(), 3);
/// assert_eq!(entry.mark(), QueueMark::Unmarked);
/// assert!(entry.is_alive());
///
/// entry.expire();
/// assert!(entry.has_expired());
/// ```
#[derive(Debug, Clone)]
pub struct Entry<K> {
    key: K,
    cost: u64,
    freq: u8,
    alive: bool,
    expired: bool,
    mark: QueueMark,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

impl<K> Entry<K> {
    pub fn new(key: K, cost: u64) -> Self {
        Self {
            key,
            cost,
            freq: 0,
            alive: true,
            expired: false,
            mark: QueueMark::Unmarked,
            prev: None,
            next: None,
        }
    }

    /// Marks the entry as invalidated; the policy drops it on its next pass.
    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Marks the entry as expired.
    pub fn expire(&mut self) {
        self.expired = true;
    }

    pub fn into_key(self) -> K {
        self.key
    }
}

impl<K: Hash> Node for Entry<K> {
    type Key = K;

    #[inline]
    fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    fn cost(&self) -> u64 {
        self.cost
    }

    #[inline]
    fn frequency(&self) -> u8 {
        self.freq
    }

    #[inline]
    fn increment_frequency(&mut self) {
        self.freq = self.freq.saturating_add(1);
    }

    #[inline]
    fn decrement_frequency(&mut self) {
        self.freq = self.freq.saturating_sub(1);
    }

    #[inline]
    fn reset_frequency(&mut self) {
        self.freq = 0;
    }

    #[inline]
    fn is_alive(&self) -> bool {
        self.alive
    }

    #[inline]
    fn has_expired(&self) -> bool {
        self.expired
    }

    #[inline]
    fn mark(&self) -> QueueMark {
        self.mark
    }

    #[inline]
    fn set_mark(&mut self, mark: QueueMark) {
        self.mark = mark;
    }

    #[inline]
    fn prev(&self) -> Option<SlotId> {
        self.prev
    }

    #[inline]
    fn next(&self) -> Option<SlotId> {
        self.next
    }

    #[inline]
    fn set_prev(&mut self, prev: Option<SlotId>) {
        self.prev = prev;
    }

    #[inline]
    fn set_next(&mut self, next: Option<SlotId>) {
        self.next = next;
    }
}
