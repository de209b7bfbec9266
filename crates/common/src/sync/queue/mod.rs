// In-memory work queue shared by producers and workers
// Modular implementation: storage, errors, configuration, metrics

mod core;
mod errors;
pub mod metrics;
mod types;

pub use self::core::WorkQueue;
pub use self::errors::{QueueError, QueueResult};
pub use self::metrics::{QueueMetrics, QueueMetricsSnapshot};
pub use self::types::QueueConfig;
