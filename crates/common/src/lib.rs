//! Runtime building blocks shared across groupderef crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `runtime`: clock abstraction, rate limiting, work queues

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;
#[cfg(feature = "runtime")]
pub mod sync;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use resilience::{RateLimiter, TokenBucket, TokenBucketConfig};
#[cfg(feature = "runtime")]
pub use sync::{QueueConfig, QueueError, QueueMetricsSnapshot, QueueResult, WorkQueue};
#[cfg(feature = "runtime")]
pub use testing::{Clock, MockClock, SystemClock, TokioClock};
