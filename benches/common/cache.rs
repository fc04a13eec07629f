//! Index + arena cache layer used to drive the policy from benchmarks.

use rustc_hash::FxHashMap;
use s3fifo::prelude::*;

#[derive(Debug, Default)]
pub struct Reaper(Vec<SlotId>);

impl<N> Evictor<N> for Reaper {
    #[inline]
    fn evict(&mut self, id: SlotId, _node: &N) {
        self.0.push(id);
    }
}

pub struct PolicyCache {
    policy: S3FifoPolicy<Entry<u64>, Reaper>,
    store: SlotArena<Entry<u64>>,
    index: FxHashMap<u64, SlotId>,
}

impl PolicyCache {
    pub fn new(max_cost: u64) -> Self {
        Self {
            policy: S3FifoPolicy::new(max_cost, Reaper::default()),
            store: SlotArena::with_capacity(max_cost as usize),
            index: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn get(&mut self, key: u64) -> bool {
        match self.index.get(&key) {
            Some(&id) => {
                self.policy.read(&mut self.store, &[id]);
                true
            },
            None => false,
        }
    }

    pub fn insert(&mut self, key: u64, cost: u64) {
        if cost > self.policy.max_available_cost() || self.index.contains_key(&key) {
            return;
        }
        let id = self.store.insert(Entry::new(key, cost));
        self.index.insert(key, id);
        self.policy.add(&mut self.store, id);
        for id in self.policy.evictor_mut().0.drain(..) {
            if let Some(node) = self.store.remove(id) {
                self.index.remove(node.key());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn policy(&self) -> &S3FifoPolicy<Entry<u64>, Reaper> {
        &self.policy
    }
}
