pub mod main_queue;
pub mod s3_fifo;
pub mod small_queue;

pub use main_queue::{MAX_REINSERTIONS, MainEviction, MainEvictionCause, MainQueue};
#[cfg(feature = "metrics")]
pub use s3_fifo::S3FifoMetrics;
pub use s3_fifo::{MAX_FREQUENCY, S3FifoPolicy, S3FifoPolicyBuilder, SMALL_QUEUE_DIVISOR};
pub use small_queue::{SmallEviction, SmallQueue};
