//! Throughput control
//!
//! Token bucket and the async rate limiter built on it. Both are generic
//! over [`Clock`] so tests can drive time explicitly.

pub mod rate_limiter;

pub use rate_limiter::{RateLimiter, TokenBucket, TokenBucketConfig, RATE_LIMIT_INTERVAL};

pub use crate::testing::{Clock, MockClock, SystemClock, TokioClock};
