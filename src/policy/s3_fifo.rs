//! S3-FIFO (Simple, Scalable, Scan-resistant FIFO) admission and eviction
//!
//! Three FIFO structures over a fixed cost budget: a probationary Small
//! queue holding roughly 10% of the budget, a Main queue holding the rest,
//! and a Ghost list of key hashes for entries recently dropped out of
//! Small. The policy owns none of the entries; it links them through a
//! caller-supplied [`NodeStore`] and reports victims to an injected
//! [`Evictor`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                    S3FifoPolicy<N, E, H> Layout                      │
//! │                                                                      │
//! │   add(id) ──► ghost hit? ──yes──► MAIN  (freq reset to 0)            │
//! │                    │                                                 │
//! │                    no                                                │
//! │                    ▼                                                 │
//! │                  SMALL ── evict ──┬─ freq > 1 ──► MAIN               │
//! │                                   ├─ dead/expired ──► Evictor        │
//! │                                   └─ freq <= 1 ──► Evictor + GHOST   │
//! │                                                                      │
//! │   MAIN ── evict ──┬─ freq == 0 / dead ──► Evictor                    │
//! │                   ├─ freq > 0 ──► requeue at tail, freq - 1          │
//! │                   └─ 20th candidate ──► Evictor (forced)             │
//! │                                                                      │
//! │   GHOST: key hashes only, bounded by small.len() + main.len()        │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! After every [`add`](S3FifoPolicy::add) the policy evicts until the
//! combined cost of Small and Main fits the budget. Each step evicts from
//! Small while Small holds at least its share of the budget, otherwise from
//! Main.
//!
//! ## Thread Safety
//!
//! Not synchronized. All calls on one policy instance must be serialized by
//! the cache layer, e.g. behind the shard lock or on a single maintenance
//! thread draining read/write events.
//!
//! ## Example Usage
//!
//! ```
//! use s3fifo::ds::{SlotArena, SlotId};
//! use s3fifo::node::{Entry, Node};
//! use s3fifo::policy::s3_fifo::S3FifoPolicy;
//!
//! let mut store: SlotArena<Entry<&str>> = SlotArena::new();
//! let mut evicted = Vec::new();
//! let mut policy = S3FifoPolicy::new(100, |id: SlotId, _: &Entry<&str>| evicted.push(id));
//!
//! let page = store.insert(Entry::new("page1", 5));
//! policy.add(&mut store, page);
//! policy.read(&mut store, &[page]);
//!
//! assert_eq!(policy.small_cost(), 5);
//! assert_eq!(store.get(page).unwrap().frequency(), 1);
//! assert_eq!(policy.max_available_cost(), 10);
//! ```

use std::fmt::Debug;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;

use rustc_hash::FxBuildHasher;
use tracing::{debug, trace};

use crate::ds::{GhostList, Queue, SlotId};
use crate::error::ConfigError;
use crate::node::{Node, NodeStore, QueueMark};
use crate::policy::main_queue::MainQueue;
#[cfg(feature = "metrics")]
use crate::policy::main_queue::MainEvictionCause;
use crate::policy::small_queue::{SmallEviction, SmallQueue};
use crate::traits::Evictor;

/// Frequency saturation point for [`S3FifoPolicy::read`].
pub const MAX_FREQUENCY: u8 = 3;

/// The Small queue's budget is `max_cost / SMALL_QUEUE_DIVISOR`.
pub const SMALL_QUEUE_DIVISOR: u64 = 10;

/// Performance counters for S3-FIFO decisions.
#[cfg(feature = "metrics")]
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct S3FifoMetrics {
    /// Nodes admitted through `add`.
    pub adds: u64,
    /// Nodes touched through `read`.
    pub reads: u64,
    /// Nodes removed through `delete`.
    pub deletes: u64,
    /// Promotions from Small to Main.
    pub promotions: u64,
    /// Admissions straight into Main on a ghost hit.
    pub ghost_hits: u64,
    /// Main candidates requeued with frequency decremented.
    pub main_reinsertions: u64,
    /// Small evictions that left a ghost entry.
    pub small_evictions: u64,
    /// Main evictions of nodes whose frequency ran out.
    pub main_evictions: u64,
    /// Main evictions forced by the reinsertion cap.
    pub forced_evictions: u64,
    /// Dead or expired nodes dropped from either queue.
    pub dead_evictions: u64,
}

#[cfg(feature = "metrics")]
impl S3FifoMetrics {
    /// Total nodes handed to the evictor.
    pub fn evictions(&self) -> u64 {
        self.small_evictions + self.main_evictions + self.forced_evictions + self.dead_evictions
    }
}

#[cfg(feature = "metrics")]
impl std::fmt::Display for S3FifoMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "S3FifoMetrics {{ adds: {}, reads: {}, deletes: {}, promotions: {}, ghost_hits: {}, \
             main_reinsertions: {}, small_evictions: {}, main_evictions: {}, forced_evictions: {}, \
             dead_evictions: {} }}",
            self.adds,
            self.reads,
            self.deletes,
            self.promotions,
            self.ghost_hits,
            self.main_reinsertions,
            self.small_evictions,
            self.main_evictions,
            self.forced_evictions,
            self.dead_evictions
        )
    }
}

fn validate_max_cost(max_cost: u64) -> Result<(), ConfigError> {
    if max_cost < SMALL_QUEUE_DIVISOR {
        return Err(ConfigError::new(format!(
            "max_cost must be at least {}, got {}",
            SMALL_QUEUE_DIVISOR, max_cost
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for [`S3FifoPolicy`] with a custom ghost hasher.
///
/// ```
/// use std::collections::hash_map::RandomState;
///
/// use s3fifo::ds::SlotId;
/// use s3fifo::node::Entry;
/// use s3fifo::policy::s3_fifo::{S3FifoPolicy, S3FifoPolicyBuilder};
///
/// let noop = |_: SlotId, _: &Entry<String>| {};
/// let policy: S3FifoPolicy<Entry<String>, _, RandomState> = S3FifoPolicyBuilder::new(1_000)
///     .hasher(RandomState::new())
///     .build(noop);
/// assert_eq!(policy.max_available_cost(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct S3FifoPolicyBuilder<H = FxBuildHasher> {
    max_cost: u64,
    hasher: H,
}

impl S3FifoPolicyBuilder<FxBuildHasher> {
    pub fn new(max_cost: u64) -> Self {
        Self {
            max_cost,
            hasher: FxBuildHasher,
        }
    }
}

impl<H: BuildHasher> S3FifoPolicyBuilder<H> {
    /// Sets the hasher used for ghost key hashes.
    pub fn hasher<H2: BuildHasher>(self, hasher: H2) -> S3FifoPolicyBuilder<H2> {
        S3FifoPolicyBuilder {
            max_cost: self.max_cost,
            hasher,
        }
    }

    /// Builds the policy.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid. See [`try_build`](Self::try_build).
    pub fn build<N, E>(self, evictor: E) -> S3FifoPolicy<N, E, H>
    where
        N: Node,
        E: Evictor<N>,
    {
        match self.try_build(evictor) {
            Ok(policy) => policy,
            Err(e) => panic!("{}", e),
        }
    }

    /// Builds the policy, returning an error on invalid parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `max_cost` is below [`SMALL_QUEUE_DIVISOR`],
    /// which would leave the Small queue without budget.
    pub fn try_build<N, E>(self, evictor: E) -> Result<S3FifoPolicy<N, E, H>, ConfigError>
    where
        N: Node,
        E: Evictor<N>,
    {
        validate_max_cost(self.max_cost)?;
        let small_max = self.max_cost / SMALL_QUEUE_DIVISOR;
        Ok(S3FifoPolicy {
            small: SmallQueue::new(small_max),
            main: MainQueue::new(self.max_cost - small_max),
            ghost: GhostList::with_hasher(self.hasher),
            evictor,
            max_cost: self.max_cost,
            #[cfg(feature = "metrics")]
            metrics: S3FifoMetrics::default(),
            _node: PhantomData,
        })
    }
}

// ---------------------------------------------------------------------------
// S3FifoPolicy
// ---------------------------------------------------------------------------

/// S3-FIFO policy over a cost budget.
///
/// # Type Parameters
///
/// - `N`: node type the store holds
/// - `E`: eviction callback, any `FnMut(SlotId, &N)` or custom [`Evictor`]
/// - `H`: hasher for ghost key hashes
pub struct S3FifoPolicy<N, E, H = FxBuildHasher> {
    small: SmallQueue,
    main: MainQueue,
    ghost: GhostList<H>,
    evictor: E,
    max_cost: u64,

    #[cfg(feature = "metrics")]
    metrics: S3FifoMetrics,

    _node: PhantomData<fn(&N)>,
}

impl<N, E> S3FifoPolicy<N, E, FxBuildHasher>
where
    N: Node,
    E: Evictor<N>,
{
    /// Creates a policy with budget `max_cost`, split 10% Small / 90% Main.
    ///
    /// # Panics
    ///
    /// Panics if `max_cost` is below [`SMALL_QUEUE_DIVISOR`]. See
    /// [`try_new`](Self::try_new).
    pub fn new(max_cost: u64, evictor: E) -> Self {
        S3FifoPolicyBuilder::new(max_cost).build(evictor)
    }

    /// Creates a policy, returning an error on invalid parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `max_cost` is below [`SMALL_QUEUE_DIVISOR`].
    pub fn try_new(max_cost: u64, evictor: E) -> Result<Self, ConfigError> {
        S3FifoPolicyBuilder::new(max_cost).try_build(evictor)
    }
}

impl<N, E, H> S3FifoPolicy<N, E, H>
where
    N: Node,
    E: Evictor<N>,
    H: BuildHasher,
{
    /// Returns the overall cost budget.
    #[inline]
    pub fn max_cost(&self) -> u64 {
        self.max_cost
    }

    /// Largest single-entry cost the policy can hold, the Small budget.
    ///
    /// The cache layer must reject larger entries before calling
    /// [`add`](Self::add).
    #[inline]
    pub fn max_available_cost(&self) -> u64 {
        self.small.max_cost()
    }

    /// Combined cost of Small and Main.
    #[inline]
    pub fn cost(&self) -> u64 {
        self.small.cost() + self.main.cost()
    }

    #[inline]
    pub fn small_cost(&self) -> u64 {
        self.small.cost()
    }

    #[inline]
    pub fn main_cost(&self) -> u64 {
        self.main.cost()
    }

    #[inline]
    pub fn small_len(&self) -> usize {
        self.small.len()
    }

    #[inline]
    pub fn main_len(&self) -> usize {
        self.main.len()
    }

    #[inline]
    pub fn ghost_len(&self) -> usize {
        self.ghost.len()
    }

    /// Number of tracked nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.small.len() + self.main.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `key` has a ghost entry.
    #[inline]
    pub fn contains_ghost<K: Hash + ?Sized>(&self, key: &K) -> bool {
        self.ghost.contains(key)
    }

    #[inline]
    pub fn evictor(&self) -> &E {
        &self.evictor
    }

    #[inline]
    pub fn evictor_mut(&mut self) -> &mut E {
        &mut self.evictor
    }

    /// Returns performance metrics if the `metrics` feature is enabled.
    #[cfg(feature = "metrics")]
    #[inline]
    pub fn metrics(&self) -> &S3FifoMetrics {
        &self.metrics
    }

    /// Resets performance metrics to zero.
    #[cfg(feature = "metrics")]
    #[inline]
    pub fn reset_metrics(&mut self) {
        self.metrics = S3FifoMetrics::default();
    }

    /// Records a hit on each node, saturating at [`MAX_FREQUENCY`].
    ///
    /// Queues are not reordered and nothing is evicted.
    pub fn read<S>(&mut self, store: &mut S, ids: &[SlotId])
    where
        S: NodeStore<Node = N>,
    {
        for &id in ids {
            let Some(node) = store.node_mut(id) else {
                continue;
            };
            if node.frequency() < MAX_FREQUENCY {
                node.increment_frequency();
            }
            #[cfg(feature = "metrics")]
            {
                self.metrics.reads += 1;
            }
        }
    }

    /// Admits an untracked node, then evicts until the budget fits.
    ///
    /// A node whose key hash is in the ghost list goes straight to Main with
    /// its frequency reset; anything else starts in Small. Nodes already in
    /// a queue are ignored.
    pub fn add<S>(&mut self, store: &mut S, id: SlotId)
    where
        S: NodeStore<Node = N>,
    {
        let Some(node) = store.node(id) else {
            debug!(slot = id.index(), "add of unknown slot ignored");
            return;
        };
        if node.mark() != QueueMark::Unmarked {
            debug!(slot = id.index(), mark = ?node.mark(), "add of tracked node ignored");
            return;
        }
        if node.cost() > self.max_available_cost() {
            debug!(
                slot = id.index(),
                cost = node.cost(),
                max = self.max_available_cost(),
                "admitting node larger than the small budget"
            );
        }
        let hash = self.ghost.hash_key(node.key());

        #[cfg(feature = "metrics")]
        {
            self.metrics.adds += 1;
        }

        if self.ghost.contains_hash(hash) {
            trace!(slot = id.index(), "ghost hit, admitting into main");
            self.main.insert(store, id);
            if let Some(node) = store.node_mut(id) {
                node.reset_frequency();
            }
            #[cfg(feature = "metrics")]
            {
                self.metrics.ghost_hits += 1;
            }
        } else {
            self.small.insert(store, id);
        }

        while self.cost() > self.max_cost {
            if !self.evict_one(store) {
                debug!(
                    cost = self.cost(),
                    max_cost = self.max_cost,
                    "eviction made no progress, leaving policy over budget"
                );
                break;
            }
        }
    }

    /// Runs one eviction step: Small while it holds at least its share of
    /// the budget, otherwise Main, falling back to Small when Main has
    /// nothing to give.
    ///
    /// Returns `false` if no node was evicted or promoted.
    pub fn evict_one<S>(&mut self, store: &mut S) -> bool
    where
        S: NodeStore<Node = N>,
    {
        if self.small.cost() >= self.small.max_cost() {
            return self.evict_small(store);
        }
        self.evict_main(store).is_some() || self.evict_small(store)
    }

    /// Stops tracking a node without signalling eviction. No-op for nodes
    /// in neither queue.
    pub fn delete<S>(&mut self, store: &mut S, id: SlotId)
    where
        S: NodeStore<Node = N>,
    {
        let mark = store.node(id).map(|node| node.mark());
        let deleted = match mark {
            Some(QueueMark::Small) => self.small.delete(store, id),
            Some(QueueMark::Main) => self.main.delete(store, id),
            _ => false,
        };
        if !deleted {
            debug!(slot = id.index(), ?mark, "delete of untracked node ignored");
            // Marked but unreachable: its neighbours left the store.
            if let Some(node) = store.node_mut(id) {
                node.unmark();
                node.set_prev(None);
                node.set_next(None);
            }
            return;
        }
        #[cfg(feature = "metrics")]
        {
            self.metrics.deletes += 1;
        }
    }

    /// Forgets every node and ghost entry without signalling eviction.
    ///
    /// Former members are unlinked, unmarked and have their frequency reset,
    /// so re-adding them behaves as on a fresh policy.
    pub fn clear<S>(&mut self, store: &mut S)
    where
        S: NodeStore<Node = N>,
    {
        self.ghost.clear();
        self.main.clear(store);
        self.small.clear(store);
    }

    // -----------------------------------------------------------------------
    // Eviction
    // -----------------------------------------------------------------------

    fn evict_small<S>(&mut self, store: &mut S) -> bool
    where
        S: NodeStore<Node = N>,
    {
        match self
            .small
            .evict(store, &mut self.main, &mut self.ghost, &mut self.evictor)
        {
            SmallEviction::Empty => false,
            SmallEviction::Dead(_) => {
                #[cfg(feature = "metrics")]
                {
                    self.metrics.dead_evictions += 1;
                }
                true
            },
            SmallEviction::Ghosted(_) => {
                #[cfg(feature = "metrics")]
                {
                    self.metrics.small_evictions += 1;
                }
                true
            },
            SmallEviction::Promoted(id) => {
                trace!(slot = id.index(), main_cost = self.main.cost(), "promoted to main");
                #[cfg(feature = "metrics")]
                {
                    self.metrics.promotions += 1;
                }

                let mut promoted_evicted = false;
                while self.main.is_full() {
                    match self.evict_main(store) {
                        Some(victim) => promoted_evicted |= victim == id,
                        None => break,
                    }
                }
                if !promoted_evicted && let Some(node) = store.node_mut(id) {
                    node.reset_frequency();
                }
                true
            },
        }
    }

    fn evict_main<S>(&mut self, store: &mut S) -> Option<SlotId>
    where
        S: NodeStore<Node = N>,
    {
        let out = self.main.evict(store, &mut self.evictor)?;
        #[cfg(feature = "metrics")]
        {
            self.metrics.main_reinsertions += out.reinsertions as u64;
            match out.cause {
                MainEvictionCause::Dead => self.metrics.dead_evictions += 1,
                MainEvictionCause::Cold => self.metrics.main_evictions += 1,
                MainEvictionCause::Forced => self.metrics.forced_evictions += 1,
            }
        }
        Some(out.id)
    }

    /// Validates internal invariants (debug-only).
    #[cfg(debug_assertions)]
    pub fn check_invariants<S>(&self, store: &S) -> Result<(), crate::error::InvariantError>
    where
        S: NodeStore<Node = N>,
    {
        use crate::error::InvariantError;

        check_queue("Small", self.small.queue(), store, QueueMark::Small, self.small.cost())?;
        check_queue("Main", self.main.queue(), store, QueueMark::Main, self.main.cost())?;

        if !self.ghost.is_consistent() {
            return Err(InvariantError::new(format!(
                "Ghost queue/set disagree (queue len {})",
                self.ghost.len()
            )));
        }

        if self.cost() > self.max_cost {
            return Err(InvariantError::new(format!(
                "Total cost {} > max_cost {}",
                self.cost(),
                self.max_cost
            )));
        }

        Ok(())
    }
}

/// Walks `queue` head to tail checking links, marks and the cost sum.
#[cfg(debug_assertions)]
fn check_queue<S: NodeStore>(
    name: &str,
    queue: &Queue,
    store: &S,
    mark: QueueMark,
    expected_cost: u64,
) -> Result<(), crate::error::InvariantError> {
    use crate::error::InvariantError;

    let mut count = 0usize;
    let mut cost = 0u64;
    let mut prev: Option<SlotId> = None;
    let mut current = queue.head();
    while let Some(id) = current {
        count += 1;
        if count > queue.len() {
            return Err(InvariantError::new(format!(
                "{} queue: walk exceeds len {} (cycle?)",
                name,
                queue.len()
            )));
        }
        let node = store
            .node(id)
            .ok_or_else(|| InvariantError::new(format!("{} queue: stale SlotId {:?}", name, id)))?;
        if node.mark() != mark {
            return Err(InvariantError::new(format!(
                "{} queue: node {:?} has mark {:?}",
                name,
                id,
                node.mark()
            )));
        }
        if node.prev() != prev {
            return Err(InvariantError::new(format!(
                "{} queue: node {:?} prev pointer inconsistent",
                name, id
            )));
        }
        cost += node.cost();
        prev = Some(id);
        current = node.next();
    }

    if count != queue.len() {
        return Err(InvariantError::new(format!(
            "{} queue: counted {} but len = {}",
            name,
            count,
            queue.len()
        )));
    }
    if queue.tail() != prev {
        return Err(InvariantError::new(format!(
            "{} queue: tail {:?} but walk ended at {:?}",
            name,
            queue.tail(),
            prev
        )));
    }
    if cost != expected_cost {
        return Err(InvariantError::new(format!(
            "{} queue: member cost {} but tracked cost {}",
            name, cost, expected_cost
        )));
    }
    Ok(())
}

impl<N, E, H> Debug for S3FifoPolicy<N, E, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3FifoPolicy")
            .field("max_cost", &self.max_cost)
            .field("small_len", &self.small.len())
            .field("small_cost", &self.small.cost())
            .field("small_max_cost", &self.small.max_cost())
            .field("main_len", &self.main.len())
            .field("main_cost", &self.main.cost())
            .field("main_max_cost", &self.main.max_cost())
            .field("ghost_len", &self.ghost.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
