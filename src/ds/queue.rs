//! Intrusive FIFO queue over externally stored nodes.
//!
//! The queue holds only `head`, `tail` and a length. Links live inside the
//! nodes themselves ([`Node::prev`] / [`Node::next`]) and every operation
//! resolves handles through the caller's [`NodeStore`].
//!
//! ## Architecture
//!
//! ```text
//!   store (NodeStore)
//!   ┌────────┬──────────────────────────────────────┐
//!   │ SlotId │ node { .., prev, next }              │
//!   ├────────┼──────────────────────────────────────┤
//!   │ id_1   │ { prev: None,       next: Some(id_2) }│
//!   │ id_2   │ { prev: Some(id_1), next: Some(id_3) }│
//!   │ id_3   │ { prev: Some(id_2), next: None }      │
//!   └────────┴──────────────────────────────────────┘
//!
//!   head ─► [id_1] ◄──► [id_2] ◄──► [id_3] ◄── tail
//!   pop                                       push
//! ```
//!
//! ## Operations
//! - `push(id)`: append at tail
//! - `pop()`: unlink and return head
//! - `delete(id)`: unlink an arbitrary member; no-op for non-members
//!
//! All three are O(1) while every member resolves in the store.
//!
//! ## Dropped members
//!
//! A member removed from the store without a `delete` leaves dangling links
//! in its neighbours. The queue notices the break when an operation touches
//! it, and then relinks around it. It keeps the segment reachable from the
//! head and the segment reachable from the tail, and joins the two. Members
//! stranded between two breaks are no longer linked. [`SlotId`]s are
//! generation-checked, so a dangling link keeps failing to resolve even
//! after the store reuses the slot. After a repair,
//! [`Queue::take_repaired`] reports `true` once, so owners can recount what
//! they track per member.
//!
//! Membership of *another* queue is not detected; callers track which queue
//! a node belongs to. `debug_validate_invariants()` is available in
//! debug/test builds.

use tracing::debug;

use crate::ds::SlotId;
use crate::node::{Node, NodeStore};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// Head/tail bookkeeping for a doubly linked list threaded through nodes.
pub struct Queue {
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
    repaired: bool,
}

/// Result of unlinking a single node.
enum Unlink {
    Unlinked,
    NotMember,
    /// A neighbour link does not resolve back to the node.
    Broken,
}

impl Queue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes in the queue.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the oldest node.
    #[inline]
    pub fn head(&self) -> Option<SlotId> {
        self.head
    }

    /// Returns the newest node.
    #[inline]
    pub fn tail(&self) -> Option<SlotId> {
        self.tail
    }

    /// Returns `true` if links were repaired since the last call.
    #[inline]
    pub fn take_repaired(&mut self) -> bool {
        std::mem::take(&mut self.repaired)
    }

    /// Appends `id` at the tail. Unresolvable handles are ignored.
    pub fn push<S: NodeStore>(&mut self, store: &mut S, id: SlotId) {
        if store.node(id).is_none() {
            return;
        }
        if self.tail.is_some_and(|tail| store.node(tail).is_none()) {
            self.repair(store);
        }

        let old_tail = self.tail;
        if let Some(node) = store.node_mut(id) {
            node.set_prev(old_tail);
            node.set_next(None);
        }
        match old_tail.and_then(|tail| store.node_mut(tail)) {
            Some(tail_node) => tail_node.set_next(Some(id)),
            None => self.head = Some(id),
        }

        self.tail = Some(id);
        self.len += 1;
    }

    /// Unlinks and returns the head, or `None` if the queue is empty.
    pub fn pop<S: NodeStore>(&mut self, store: &mut S) -> Option<SlotId> {
        let id = self.head?;
        if let Unlink::Unlinked = self.unlink(store, id) {
            return Some(id);
        }
        self.repair(store);
        let id = self.head?;
        matches!(self.unlink(store, id), Unlink::Unlinked).then_some(id)
    }

    /// Unlinks `id` from the queue. Returns `false` without touching any
    /// member when `id` is not linked here.
    pub fn delete<S: NodeStore>(&mut self, store: &mut S, id: SlotId) -> bool {
        match self.unlink(store, id) {
            Unlink::Unlinked => true,
            Unlink::NotMember => false,
            Unlink::Broken => {
                self.repair(store);
                matches!(self.unlink(store, id), Unlink::Unlinked)
            },
        }
    }

    fn unlink<S: NodeStore>(&mut self, store: &mut S, id: SlotId) -> Unlink {
        let (prev, next) = match store.node(id) {
            Some(node) => (node.prev(), node.next()),
            None => return Unlink::NotMember,
        };

        // An end node with an outward link was relinked behind the queue's back.
        if (self.head == Some(id) && prev.is_some()) || (self.tail == Some(id) && next.is_some()) {
            return Unlink::Broken;
        }

        match prev {
            None if self.head != Some(id) => return Unlink::NotMember,
            Some(p) if store.node(p).map(|n| n.next()) != Some(Some(id)) => {
                return Unlink::Broken;
            },
            _ => {},
        }
        match next {
            None if self.tail != Some(id) => return Unlink::NotMember,
            Some(n) if store.node(n).map(|n| n.prev()) != Some(Some(id)) => {
                return Unlink::Broken;
            },
            _ => {},
        }

        match prev.and_then(|p| store.node_mut(p)) {
            Some(prev_node) => prev_node.set_next(next),
            None => self.head = next,
        }
        match next.and_then(|n| store.node_mut(n)) {
            Some(next_node) => next_node.set_prev(prev),
            None => self.tail = prev,
        }
        if let Some(node) = store.node_mut(id) {
            node.set_prev(None);
            node.set_next(None);
        }

        self.len = self.len.saturating_sub(1);
        Unlink::Unlinked
    }

    /// Relinks the queue around members that no longer resolve.
    fn repair<S: NodeStore>(&mut self, store: &mut S) {
        let limit = self.len;
        let (front, front_len) = walk(store, self.head, limit, |n| n.next(), |n| n.prev());

        if front.is_some() && front == self.tail {
            if let Some(node) = front.and_then(|id| store.node_mut(id)) {
                node.set_next(None);
            }
            self.len = front_len;
            return;
        }

        let (back, back_len) = walk(
            store,
            self.tail,
            limit.saturating_sub(front_len),
            |n| n.prev(),
            |n| n.next(),
        );

        match (front, back) {
            (Some(f), Some(b)) => {
                if let Some(node) = store.node_mut(f) {
                    node.set_next(Some(b));
                }
                if let Some(node) = store.node_mut(b) {
                    node.set_prev(Some(f));
                }
            },
            (Some(f), None) => {
                if let Some(node) = store.node_mut(f) {
                    node.set_next(None);
                }
                self.tail = Some(f);
            },
            (None, Some(b)) => {
                if let Some(node) = store.node_mut(b) {
                    node.set_prev(None);
                }
                self.head = Some(b);
            },
            (None, None) => {
                self.head = None;
                self.tail = None;
            },
        }

        debug!(
            old_len = self.len,
            new_len = front_len + back_len,
            "queue member missing from store, relinked around it"
        );
        self.len = front_len + back_len;
        self.repaired = true;
    }

    /// Pops until empty, leaving every former member unlinked.
    pub fn clear<S: NodeStore>(&mut self, store: &mut S) {
        while self.pop(store).is_some() {}
    }

    /// Sums the cost of every linked member.
    pub fn total_cost<S: NodeStore>(&self, store: &S) -> u64 {
        self.iter(store)
            .filter_map(|id| store.node(id))
            .map(|node| node.cost())
            .sum()
    }

    /// Iterates handles from head to tail.
    pub fn iter<'a, S: NodeStore>(&self, store: &'a S) -> QueueIter<'a, S> {
        QueueIter {
            store,
            current: self.head,
            remaining: self.len,
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants<S: NodeStore>(&self, store: &S) {
        if self.head.is_none() || self.tail.is_none() {
            assert!(self.head.is_none());
            assert!(self.tail.is_none());
            assert_eq!(self.len, 0);
            return;
        }

        let mut seen = std::collections::HashSet::new();
        let mut count = 0usize;
        let mut current = self.head;
        let mut prev = None;

        while let Some(id) = current {
            assert!(seen.insert(id), "cycle at {:?}", id);
            let node = store.node(id).expect("node missing");
            assert_eq!(node.prev(), prev);
            if node.next().is_none() {
                assert_eq!(self.tail, Some(id));
            }
            prev = Some(id);
            current = node.next();
            count += 1;
            assert!(count <= self.len);
        }

        assert_eq!(count, self.len);
    }
}

/// Follows `step` links from `start` while each node resolves and points
/// back at its predecessor through `back`. Returns the last node reached
/// and how many were visited.
fn walk<S: NodeStore>(
    store: &S,
    start: Option<SlotId>,
    limit: usize,
    step: impl Fn(&S::Node) -> Option<SlotId>,
    back: impl Fn(&S::Node) -> Option<SlotId>,
) -> (Option<SlotId>, usize) {
    let mut last = None;
    let mut count = 0;
    let mut current = start;
    while let Some(id) = current {
        if count == limit {
            break;
        }
        let Some(node) = store.node(id) else {
            break;
        };
        if back(node) != last {
            break;
        }
        last = Some(id);
        count += 1;
        current = step(node);
    }
    (last, count)
}

/// Iterator over queue members from head to tail.
pub struct QueueIter<'a, S> {
    store: &'a S,
    current: Option<SlotId>,
    remaining: usize,
}

impl<S: NodeStore> Iterator for QueueIter<'_, S> {
    type Item = SlotId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.current?;
        let node = self.store.node(id)?;
        self.current = node.next();
        self.remaining -= 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl<S: NodeStore> std::iter::FusedIterator for QueueIter<'_, S> {}
