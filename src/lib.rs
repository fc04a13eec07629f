//! s3fifo: S3-FIFO admission and eviction over caller-owned nodes.
//!
//! The policy tracks which cached entries stay and which go, under a single
//! cost budget. It never owns entries or keys; the cache layer keeps nodes in
//! a [`NodeStore`](node::NodeStore), hands the policy [`SlotId`](ds::SlotId)
//! handles, and learns about victims through an [`Evictor`](traits::Evictor).
//!
//! - [`policy::s3_fifo`]: the orchestrator (`add`, `read`, `delete`, `clear`)
//! - [`policy::small_queue`] / [`policy::main_queue`]: the two resident queues
//! - [`ds`]: arena, intrusive queue and ghost list primitives
//!
//! ```
//! use s3fifo::prelude::*;
//!
//! let mut store: SlotArena<Entry<u64>> = SlotArena::new();
//! let mut evicted = Vec::new();
//! let mut policy = S3FifoPolicy::new(1_000, |id: SlotId, _: &Entry<u64>| evicted.push(id));
//!
//! for key in 0..300u64 {
//!     let id = store.insert(Entry::new(key, 5));
//!     policy.add(&mut store, id);
//! }
//! assert!(policy.cost() <= policy.max_cost());
//! drop(policy);
//! assert_eq!(evicted.len(), 100);
//! ```

pub mod ds;
pub mod error;
pub mod node;
pub mod policy;
pub mod prelude;
pub mod traits;
