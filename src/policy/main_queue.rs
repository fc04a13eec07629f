//! Main queue: CLOCK-style eviction with a bounded reinsertion scan.
//!
//! Holds entries promoted out of Small (seen at least twice) and entries
//! readmitted on a ghost hit. Eviction pops from the head; a node with
//! remaining frequency is requeued at the tail with its frequency
//! decremented instead of being evicted.
//!
//! ```text
//!   head ─► [f=2] [f=0] [f=1] ◄── tail
//!             │     │
//!             │     └── evict (frequency exhausted)
//!             └──────── requeue at tail as f=1
//! ```
//!
//! One call to [`MainQueue::evict`] removes at most one node. The
//! [`MAX_REINSERTIONS`]th hot candidate of a call is evicted regardless of
//! frequency, so a call requeues at most `MAX_REINSERTIONS - 1` nodes even
//! when every resident node is hot.

use tracing::trace;

use crate::ds::{Queue, SlotId};
use crate::node::{Node, NodeStore};
use crate::traits::Evictor;

/// Hot candidates a single eviction may inspect; the last is forced out.
pub const MAX_REINSERTIONS: usize = 20;

/// Why a node left the Main queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainEvictionCause {
    /// Invalidated or expired.
    Dead,
    /// Frequency reached zero.
    Cold,
    /// Reinsertion cap reached with frequency to spare.
    Forced,
}

/// Outcome of a successful [`MainQueue::evict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainEviction {
    pub id: SlotId,
    pub cause: MainEvictionCause,
    /// Nodes requeued at the tail before the victim was found. Always below
    /// [`MAX_REINSERTIONS`].
    pub reinsertions: usize,
}

#[derive(Debug)]
pub struct MainQueue {
    queue: Queue,
    cost: u64,
    max_cost: u64,
}

impl MainQueue {
    pub fn new(max_cost: u64) -> Self {
        Self {
            queue: Queue::new(),
            cost: 0,
            max_cost,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn cost(&self) -> u64 {
        self.cost
    }

    #[inline]
    pub fn max_cost(&self) -> u64 {
        self.max_cost
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.cost >= self.max_cost
    }

    #[inline]
    pub(crate) fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Appends `id` and marks it as a Main member. Does not evict.
    pub fn insert<S: NodeStore>(&mut self, store: &mut S, id: SlotId) {
        let Some(node) = store.node_mut(id) else {
            return;
        };
        node.mark_main();
        self.push(store, id);
    }

    fn push<S: NodeStore>(&mut self, store: &mut S, id: SlotId) {
        let Some(cost) = store.node(id).map(|node| node.cost()) else {
            return;
        };
        self.queue.push(store, id);
        self.cost += cost;
        self.sync_cost(store);
    }

    fn pop<S: NodeStore>(&mut self, store: &mut S) -> Option<SlotId> {
        let popped = self.queue.pop(store);
        match popped.and_then(|id| store.node(id)) {
            Some(node) => self.cost = self.cost.saturating_sub(node.cost()),
            None => self.cost = 0,
        }
        self.sync_cost(store);
        popped
    }

    /// Recounts cost after the queue relinked around dropped members.
    fn sync_cost<S: NodeStore>(&mut self, store: &S) {
        if self.queue.take_repaired() {
            self.cost = self.queue.total_cost(store);
        }
    }

    /// Evicts at most one node, requeueing hot candidates on the way.
    ///
    /// Returns `None` when the queue holds no cost.
    pub fn evict<S, E>(&mut self, store: &mut S, evictor: &mut E) -> Option<MainEviction>
    where
        S: NodeStore,
        E: Evictor<S::Node>,
    {
        let mut reinsertions = 0;
        while self.cost > 0 {
            let id = self.pop(store)?;
            let node = store.node_mut(id)?;

            let cause = if !node.is_alive() || node.has_expired() {
                Some(MainEvictionCause::Dead)
            } else if node.frequency() == 0 {
                Some(MainEvictionCause::Cold)
            } else if reinsertions + 1 >= MAX_REINSERTIONS {
                Some(MainEvictionCause::Forced)
            } else {
                None
            };

            let Some(cause) = cause else {
                node.decrement_frequency();
                self.push(store, id);
                reinsertions += 1;
                continue;
            };

            node.unmark();
            if cause == MainEvictionCause::Forced {
                trace!(slot = id.index(), "reinsertion cap reached, forcing eviction");
            }
            evictor.evict(id, node);
            return Some(MainEviction {
                id,
                cause,
                reinsertions,
            });
        }
        None
    }

    /// Removes `id` out of band without signalling eviction.
    pub fn delete<S: NodeStore>(&mut self, store: &mut S, id: SlotId) -> bool {
        let deleted = self.queue.delete(store, id);
        if deleted && let Some(node) = store.node_mut(id) {
            node.unmark();
            self.cost = self.cost.saturating_sub(node.cost());
        }
        self.sync_cost(store);
        deleted
    }

    /// Drops every member without signalling eviction.
    pub fn clear<S: NodeStore>(&mut self, store: &mut S) {
        while let Some(id) = self.queue.pop(store) {
            if let Some(node) = store.node_mut(id) {
                node.unmark();
                node.reset_frequency();
            }
        }
        self.queue.take_repaired();
        self.cost = 0;
    }
}
