//! Slot storage for cache nodes, addressed by generation-checked handles.
//!
//! Node handles throughout the crate are [`SlotId`]s into a `SlotArena`.
//! Removed slots go on a free list and are reused by the next insert, so a
//! long-running cache settles into a fixed-size `Vec` with no per-entry
//! allocation.
//!
//! Each slot carries a generation that is bumped when its value is removed.
//! A `SlotId` records the generation it was issued under, so a handle kept
//! past `remove` stops resolving even after the slot is reused:
//!
//! ```text
//!   insert(a) ─► SlotId { index: 1, generation: 0 }
//!   remove     ─► slot 1 generation 1, on the free list
//!   insert(b) ─► SlotId { index: 1, generation: 1 }
//!   get(old)   ─► None
//! ```
//!
//! The policy's intrusive links hold `SlotId`s, so a node dropped from the
//! arena without going through the policy shows up as a link that no longer
//! resolves, never as a link to an unrelated node.

use crate::node::{Node, NodeStore};

/// Handle to a value in a [`SlotArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId {
    index: usize,
    generation: u32,
}

impl SlotId {
    /// Returns the raw slot index. Shared by every handle ever issued for the slot.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.index
    }

    /// Returns the generation the handle was issued under.
    #[inline]
    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Vec-backed node storage with a free list.
#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> SlotArena<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an arena with room for `capacity` values before reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Stores `value` and returns its handle, reusing a freed slot if any.
    pub fn insert(&mut self, value: T) -> SlotId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.value = Some(value);
            return SlotId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        SlotId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Removes and returns the value at `id`.
    ///
    /// Returns `None` for an empty slot or a handle from an older generation.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let slot = self.slot_mut(id)?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(value)
    }

    #[inline]
    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    #[inline]
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slot_mut(id).and_then(|slot| slot.value.as_mut())
    }

    #[inline]
    pub fn contains(&self, id: SlotId) -> bool {
        self.get(id).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every value. Handles issued before the call stop resolving.
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index);
        }
        self.free.reverse();
        self.len = 0;
    }

    /// Iterates live values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let id = SlotId {
                index,
                generation: slot.generation,
            };
            slot.value.as_ref().map(|value| (id, value))
        })
    }

    fn slot_mut(&mut self, id: SlotId) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Node> NodeStore for SlotArena<N> {
    type Node = N;

    #[inline]
    fn node(&self, id: SlotId) -> Option<&N> {
        self.get(id)
    }

    #[inline]
    fn node_mut(&mut self, id: SlotId) -> Option<&mut N> {
        self.get_mut(id)
    }
}
