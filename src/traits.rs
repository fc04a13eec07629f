//! # Policy Seams
//!
//! The policy is decoupled from the cache layer's key index by a single
//! injected callback, [`Evictor`]. The policy decides *which* node leaves the
//! cache; the evictor is where the cache layer actually drops it from its
//! index and recycles the slot.
//!
//! ```text
//!   ┌───────────────┐   add / read / delete    ┌──────────────────┐
//!   │  cache layer  │ ───────────────────────► │   S3FifoPolicy   │
//!   │ (index+store) │ ◄─────────────────────── │ small/main/ghost │
//!   └───────────────┘   Evictor::evict(id, n)  └──────────────────┘
//! ```
//!
//! ## Contract
//!
//! - Called exactly once per node the policy removes, after the node has
//!   been unlinked, unmarked and its cost released.
//! - The policy never touches the node again after the call. The node's key
//!   hash may live on in the ghost list.
//! - The callback must not re-enter the policy. The usual pattern is to
//!   collect the ids (or keys) and remove them from the index once the
//!   policy call returns.
//!
//! Any `FnMut(SlotId, &N)` closure is an evictor:
//!
//! ```
//! use s3fifo::ds::SlotId;
//! use s3fifo::node::Entry;
//! use s3fifo::traits::Evictor;
//!
//! let mut evicted: Vec<SlotId> = Vec::new();
//! let mut evictor = |id: SlotId, _node: &Entry<u64>| evicted.push(id);
//! # let _ = &mut evictor;
//! ```

use crate::ds::SlotId;

/// Receives nodes the policy has decided to remove from the cache.
pub trait Evictor<N> {
    fn evict(&mut self, id: SlotId, node: &N);
}

impl<N, F> Evictor<N> for F
where
    F: FnMut(SlotId, &N),
{
    #[inline]
    fn evict(&mut self, id: SlotId, node: &N) {
        self(id, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ds::SlotArena;
    use crate::node::Entry;

    struct Collect(Vec<u32>);

    impl Evictor<Entry<u32>> for Collect {
        fn evict(&mut self, _id: SlotId, node: &Entry<u32>) {
            use crate::node::Node;
            self.0.push(*node.key());
        }
    }

    #[test]
    fn closure_is_evictor() {
        let mut arena = SlotArena::new();
        let id = arena.insert(Entry::new(7u32, 1));
        let mut seen = Vec::new();
        {
            let mut evictor = |id: SlotId, _: &Entry<u32>| seen.push(id);
            evictor.evict(id, arena.get(id).unwrap());
        }
        assert_eq!(seen, vec![id]);
    }

    #[test]
    fn struct_is_evictor() {
        let mut arena = SlotArena::new();
        let id = arena.insert(Entry::new(9u32, 1));
        let mut collect = Collect(Vec::new());
        collect.evict(id, arena.get(id).unwrap());
        assert_eq!(collect.0, vec![9]);
    }
}
