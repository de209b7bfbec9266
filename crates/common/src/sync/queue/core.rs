use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, info};

use super::errors::{QueueError, QueueResult};
use super::metrics::{QueueMetrics, QueueMetricsSnapshot};
use super::types::QueueConfig;

/// In-memory FIFO shared by any number of producers and consumers.
///
/// Pushing never waits. Consumers either take what is there
/// ([`try_pop`](Self::try_pop), [`pop_batch`](Self::pop_batch)) or wait for
/// the next item with [`pop`](Self::pop). Depth bookkeeping happens under the
/// same lock as the mutation, so the recorded maximum is the true peak.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct WorkQueue<T> {
    name: String,
    items: Mutex<VecDeque<T>>,
    max_capacity: Option<usize>,
    closed: AtomicBool,
    notify: Notify,
    metrics: QueueMetrics,
}

impl<T> WorkQueue<T> {
    /// Create an unbounded queue.
    pub fn new(name: impl Into<String>) -> Self {
        Self::build(QueueConfig::unbounded(name))
    }

    /// Create a queue from a validated configuration.
    ///
    /// # Errors
    /// Returns `QueueError::InvalidConfig` if the configuration is invalid.
    pub fn with_config(config: QueueConfig) -> QueueResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: QueueConfig) -> Self {
        Self {
            name: config.name,
            items: Mutex::new(VecDeque::new()),
            max_capacity: config.max_capacity,
            closed: AtomicBool::new(false),
            notify: Notify::new(),
            metrics: QueueMetrics::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn max_capacity(&self) -> Option<usize> {
        self.max_capacity
    }

    /// Append an item and wake one waiting consumer.
    ///
    /// # Errors
    /// - `QueueError::Closed` after [`close`](Self::close)
    /// - `QueueError::CapacityExceeded` when a bounded queue is full
    ///
    /// The item is dropped in both cases and the failure is counted.
    pub fn push(&self, item: T) -> QueueResult<()> {
        self.metrics.record_attempt();

        if self.is_closed() {
            self.metrics.record_failure();
            return Err(QueueError::Closed);
        }

        {
            let mut items = self.items.lock();
            if let Some(capacity) = self.max_capacity {
                if items.len() >= capacity {
                    drop(items);
                    self.metrics.record_failure();
                    debug!(queue = %self.name, capacity, "queue full, item dropped");
                    return Err(QueueError::CapacityExceeded(capacity));
                }
            }
            items.push_back(item);
            self.metrics.record_enqueue(items.len());
        }

        self.notify.notify_one();
        Ok(())
    }

    /// Remove the oldest item without waiting.
    pub fn try_pop(&self) -> Option<T> {
        let mut items = self.items.lock();
        let item = items.pop_front()?;
        self.metrics.record_dequeue(1, items.len());
        Some(item)
    }

    /// Remove the oldest item, waiting until one arrives.
    ///
    /// Items still queued at close time are handed out first; `None` means
    /// the queue is closed and empty. Cancel-safe: dropping the future loses
    /// no item.
    pub async fn pop(&self) -> Option<T> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a push between the check and the
            // await is not missed.
            notified.as_mut().enable();

            if let Some(item) = self.try_pop() {
                return Some(item);
            }
            if self.is_closed() {
                return None;
            }

            notified.await;
        }
    }

    /// Remove up to `max_items` items without waiting.
    ///
    /// Returns fewer (possibly none) when the queue runs dry.
    pub fn pop_batch(&self, max_items: usize) -> Vec<T> {
        if max_items == 0 {
            return Vec::new();
        }

        let mut items = self.items.lock();
        let take = max_items.min(items.len());
        let batch: Vec<T> = items.drain(..take).collect();
        if !batch.is_empty() {
            self.metrics.record_dequeue(batch.len(), items.len());
        }
        batch
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Refuse further pushes and wake every waiting consumer.
    pub fn close(&self) {
        if !self.closed.swap(true, AtomicOrdering::SeqCst) {
            info!(queue = %self.name, remaining = self.len(), "queue closed");
        }
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(AtomicOrdering::SeqCst)
    }

    /// Current counters. Reading has no side effects.
    pub fn metrics(&self) -> QueueMetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl<T> std::fmt::Debug for WorkQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue")
            .field("name", &self.name)
            .field("len", &self.len())
            .field("max_capacity", &self.max_capacity)
            .field("closed", &self.is_closed())
            .finish()
    }
}
