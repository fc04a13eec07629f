pub use crate::ds::{GhostList, Queue, SlotArena, SlotId};
pub use crate::error::{ConfigError, InvariantError};
pub use crate::node::{Entry, Node, NodeStore, QueueMark};
#[cfg(feature = "metrics")]
pub use crate::policy::S3FifoMetrics;
pub use crate::policy::{MAX_FREQUENCY, S3FifoPolicy, S3FifoPolicyBuilder, SMALL_QUEUE_DIVISOR};
pub use crate::traits::Evictor;
