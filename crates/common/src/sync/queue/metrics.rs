use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};

use serde::{Deserialize, Serialize};

/// Queue metrics for monitoring
///
/// Counters only grow for the lifetime of the queue; `max_depth` never
/// decreases.
#[derive(Debug, Default)]
pub struct QueueMetrics {
    enqueue_attempts: AtomicU64,
    enqueue_failures: AtomicU64,
    total_enqueued: AtomicU64,
    total_dequeued: AtomicU64,
    current_depth: AtomicUsize,
    max_depth: AtomicUsize,
    last_operation_time: AtomicU64,
}

impl QueueMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a push attempt, successful or not
    pub fn record_attempt(&self) {
        self.enqueue_attempts.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record a push that dropped its item
    pub fn record_failure(&self) {
        self.enqueue_failures.fetch_add(1, AtomicOrdering::Relaxed);
        self.update_last_operation();
    }

    /// Record a successful push leaving the queue at `depth`
    pub fn record_enqueue(&self, depth: usize) {
        self.total_enqueued.fetch_add(1, AtomicOrdering::Relaxed);
        self.current_depth.store(depth, AtomicOrdering::Relaxed);
        self.update_max_depth(depth);
        self.update_last_operation();
    }

    /// Record `count` items removed, leaving the queue at `depth`
    pub fn record_dequeue(&self, count: usize, depth: usize) {
        self.total_dequeued.fetch_add(count as u64, AtomicOrdering::Relaxed);
        self.current_depth.store(depth, AtomicOrdering::Relaxed);
        self.update_last_operation();
    }

    /// Raise the observed maximum to `depth`; smaller values never replace it
    fn update_max_depth(&self, depth: usize) {
        let mut max = self.max_depth.load(AtomicOrdering::Relaxed);

        while depth > max {
            match self.max_depth.compare_exchange_weak(
                max,
                depth,
                AtomicOrdering::Relaxed,
                AtomicOrdering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => max = actual,
            }
        }
    }

    fn update_last_operation(&self) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        self.last_operation_time
            .store(u64::try_from(now).unwrap_or(u64::MAX), AtomicOrdering::Relaxed);
    }

    /// Get a snapshot of metrics
    pub fn snapshot(&self) -> QueueMetricsSnapshot {
        QueueMetricsSnapshot {
            enqueue_attempts: self.enqueue_attempts.load(AtomicOrdering::Relaxed),
            enqueue_failures: self.enqueue_failures.load(AtomicOrdering::Relaxed),
            total_enqueued: self.total_enqueued.load(AtomicOrdering::Relaxed),
            total_dequeued: self.total_dequeued.load(AtomicOrdering::Relaxed),
            current_depth: self.current_depth.load(AtomicOrdering::Relaxed),
            max_depth: self.max_depth.load(AtomicOrdering::Relaxed),
            last_operation_time_ms: self.last_operation_time.load(AtomicOrdering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`QueueMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueMetricsSnapshot {
    pub enqueue_attempts: u64,
    pub enqueue_failures: u64,
    pub total_enqueued: u64,
    pub total_dequeued: u64,
    pub current_depth: usize,
    pub max_depth: usize,
    /// Milliseconds since the UNIX epoch of the last recorded change; 0 if
    /// nothing was recorded yet
    pub last_operation_time_ms: u64,
}
