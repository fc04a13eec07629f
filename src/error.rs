//! Error types.
//!
//! Policy operations never fail; misuse degrades to a no-op. Errors only
//! surface at construction time and from debug invariant checks.
//!
//! - [`ConfigError`]: rejected policy configuration (e.g. a budget too small
//!   to give the Small queue any room).
//! - [`InvariantError`]: reported by
//!   [`S3FifoPolicy::check_invariants`](crate::policy::s3_fifo::S3FifoPolicy::check_invariants)
//!   when queue links, costs or marks disagree.
//!
//! ```
//! use s3fifo::error::ConfigError;
//! use s3fifo::node::Entry;
//! use s3fifo::policy::s3_fifo::S3FifoPolicy;
//! use s3fifo::ds::SlotId;
//!
//! let noop = |_: SlotId, _: &Entry<u64>| {};
//! let err: ConfigError = S3FifoPolicy::<Entry<u64>, _>::try_new(5, noop).unwrap_err();
//! assert!(err.to_string().contains("max_cost"));
//! ```

use std::fmt;

/// Error returned when policy configuration parameters are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Error returned when internal policy invariants are violated.
///
/// Carries a description of the first invariant found broken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}
