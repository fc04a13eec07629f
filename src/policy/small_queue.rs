//! Small queue: probationary FIFO for newly admitted entries.
//!
//! Eviction pops the oldest node and routes it by what happened while it
//! was on probation:
//!
//! | Node state at pop         | Outcome                                   |
//! |---------------------------|-------------------------------------------|
//! | dead or expired           | evicted                                   |
//! | frequency > 1             | promoted into Main                        |
//! | frequency <= 1            | evicted, key hash recorded in the ghost   |
//!
//! Promotion only links the node into Main; the caller runs Main's own
//! eviction loop and resets the promoted node's frequency afterwards.

use std::hash::BuildHasher;

use crate::ds::{GhostList, Queue, SlotId};
use crate::node::{Node, NodeStore};
use crate::policy::main_queue::MainQueue;
use crate::traits::Evictor;

/// Outcome of [`SmallQueue::evict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmallEviction {
    /// Nothing to evict.
    Empty,
    /// Dead or expired node removed from the cache.
    Dead(SlotId),
    /// Node moved into Main.
    Promoted(SlotId),
    /// Node removed from the cache with its key hash left in the ghost.
    Ghosted(SlotId),
}

#[derive(Debug)]
pub struct SmallQueue {
    queue: Queue,
    cost: u64,
    max_cost: u64,
}

impl SmallQueue {
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
    pub(crate) fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Appends `id` and marks it as a Small member.
    pub fn insert<S: NodeStore>(&mut self, store: &mut S, id: SlotId) {
        let Some(node) = store.node_mut(id) else {
            return;
        };
        node.mark_small();
        let cost = node.cost();
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

    /// Pops the oldest node and evicts, promotes or ghosts it.
    ///
    /// The ghost bound is the live entry count of both queues, taken after
    /// the node has left Small.
    pub fn evict<S, E, H>(
        &mut self,
        store: &mut S,
        main: &mut MainQueue,
        ghost: &mut GhostList<H>,
        evictor: &mut E,
    ) -> SmallEviction
    where
        S: NodeStore,
        E: Evictor<S::Node>,
        H: BuildHasher,
    {
        if self.cost == 0 {
            return SmallEviction::Empty;
        }
        let Some(id) = self.pop(store) else {
            return SmallEviction::Empty;
        };
        let Some(node) = store.node_mut(id) else {
            return SmallEviction::Empty;
        };
        node.unmark();

        if !node.is_alive() || node.has_expired() {
            evictor.evict(id, node);
            return SmallEviction::Dead(id);
        }

        if node.frequency() > 1 {
            main.insert(store, id);
            return SmallEviction::Promoted(id);
        }

        let hash = ghost.hash_key(node.key());
        evictor.evict(id, node);
        ghost.record(hash, self.len() + main.len());
        SmallEviction::Ghosted(id)
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
