#![allow(dead_code)]

//! Minimal cache layer driving the policy the way a real cache would: a key
//! index over a slot arena, with evicted slots reaped after each call.

use rustc_hash::FxHashMap;
use s3fifo::prelude::*;

/// Collects evicted handles for the cache layer to reap.
#[derive(Debug, Default)]
pub struct Reaper {
    pending: Vec<SlotId>,
}

impl<N> Evictor<N> for Reaper {
    fn evict(&mut self, id: SlotId, _node: &N) {
        self.pending.push(id);
    }
}

pub struct TestCache {
    pub policy: S3FifoPolicy<Entry<u64>, Reaper>,
    pub store: SlotArena<Entry<u64>>,
    pub index: FxHashMap<u64, SlotId>,
    /// Keys in the order the policy evicted them.
    pub evicted: Vec<u64>,
}

impl TestCache {
    pub fn new(max_cost: u64) -> Self {
        Self {
            policy: S3FifoPolicy::new(max_cost, Reaper::default()),
            store: SlotArena::new(),
            index: FxHashMap::default(),
            evicted: Vec::new(),
        }
    }

    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    /// Lookup; a hit is reported to the policy.
    pub fn get(&mut self, key: u64) -> bool {
        match self.index.get(&key) {
            Some(&id) => {
                self.policy.read(&mut self.store, &[id]);
                true
            },
            None => false,
        }
    }

    /// Inserts or replaces `key`. Entries above the policy's per-entry limit
    /// are rejected.
    pub fn insert(&mut self, key: u64, cost: u64) -> Option<SlotId> {
        if cost > self.policy.max_available_cost() {
            return None;
        }
        self.remove(key);
        let id = self.store.insert(Entry::new(key, cost));
        self.index.insert(key, id);
        self.policy.add(&mut self.store, id);
        self.reap();
        Some(id)
    }

    pub fn remove(&mut self, key: u64) -> bool {
        let Some(id) = self.index.remove(&key) else {
            return false;
        };
        self.policy.delete(&mut self.store, id);
        self.store.remove(id);
        true
    }

    /// Drops `key` from the store and index without telling the policy.
    pub fn forget(&mut self, key: u64) -> bool {
        match self.index.remove(&key) {
            Some(id) => self.store.remove(id).is_some(),
            None => false,
        }
    }

    /// Marks `key` as invalidated without removing it.
    pub fn kill(&mut self, key: u64) -> bool {
        match self.index.get(&key).and_then(|&id| self.store.get_mut(id)) {
            Some(node) => {
                node.kill();
                true
            },
            None => false,
        }
    }

    pub fn evict_one(&mut self) -> bool {
        let progressed = self.policy.evict_one(&mut self.store);
        self.reap();
        progressed
    }

    pub fn clear(&mut self) {
        self.policy.clear(&mut self.store);
        self.store.clear();
        self.index.clear();
    }

    pub fn contains(&self, key: u64) -> bool {
        self.index.contains_key(&key)
    }

    pub fn node(&self, key: u64) -> Option<&Entry<u64>> {
        self.index.get(&key).and_then(|&id| self.store.get(id))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn check(&self) {
        #[cfg(debug_assertions)]
        if let Err(err) = self.policy.check_invariants(&self.store) {
            panic!("invariant violated: {}", err);
        }
    }

    fn reap(&mut self) {
        for id in std::mem::take(&mut self.policy.evictor_mut().pending) {
            let Some(node) = self.store.remove(id) else {
                continue;
            };
            assert_eq!(node.mark(), QueueMark::Unmarked, "evicted node still marked");
            let key = node.into_key();
            if self.index.get(&key) == Some(&id) {
                self.index.remove(&key);
            }
            self.evicted.push(key);
        }
    }
}
