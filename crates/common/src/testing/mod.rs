//! Testing utilities and helpers
//!
//! - **[`time`]**: clock abstraction with system, tokio-backed and mock
//!   implementations
//!
//! ## Usage
//!
//! ```rust
//! use groupderef_common::testing::MockClock;
//!
//! fn test_with_mock_time() {
//!     let clock = MockClock::new();
//!     clock.advance(std::time::Duration::from_secs(5));
//!     // ... test with controlled time
//! }
//! ```

pub mod time;

pub use time::{Clock, MockClock, SystemClock, TokioClock};
