//! # groupderef Infrastructure
//!
//! Runtime wiring of the dereference pipeline.
//!
//! This crate contains:
//! - The worker pool executing dereference operations
//! - Configuration loading from files and the environment
//! - Tracing subscriber setup
//! - The pipeline context the host engine talks to
//!
//! ## Architecture
//! - Builds on the ports and logic in `groupderef-core`
//! - Owns every spawned task and the process-wide queues

pub mod config;
pub mod observability;
pub mod pipeline;
pub mod workers;

// Re-export commonly used items
pub use observability::init_tracing;
pub use pipeline::DereferencePipeline;
pub use workers::{WorkerPool, WorkerPoolConfig, WorkerStats, WorkerStatsSnapshot};
