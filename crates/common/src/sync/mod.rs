//! Synchronization primitives for the dereference pipeline
//!
//! ## Submodules
//!
//! - **`queue`**: in-memory multi-producer/multi-consumer work queue with
//!   blocking pop, optional capacity bound and depth metrics

pub mod queue;

pub use queue::{
    QueueConfig, QueueError, QueueMetrics, QueueMetricsSnapshot, QueueResult, WorkQueue,
};
