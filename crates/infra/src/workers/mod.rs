//! Background workers executing dereference operations

pub mod pool;

pub use pool::{WorkerPool, WorkerPoolConfig, WorkerStats, WorkerStatsSnapshot};
