//! Worker pool draining the operation queue.
//!
//! Every worker runs the same loop: take a permit from the shared rate
//! limiter, wait for the next operation, execute it. The limiter is shared,
//! so the configured rate is a ceiling for the pool as a whole.
//!
//! Lifecycle follows the usual background-task rules: join handles are
//! tracked, cancellation is explicit and cooperative, and stopping waits for
//! each worker only up to the configured join timeout. An operation that is
//! already executing when the pool stops is allowed to finish.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use groupderef_common::sync::WorkQueue;
//! use groupderef_core::RecordSinks;
//! use groupderef_infra::workers::{WorkerPool, WorkerPoolConfig};
//!
//! # async fn example() -> groupderef_domain::Result<()> {
//! let operations = Arc::new(WorkQueue::new("dereference-operations"));
//! let sinks = RecordSinks::new(
//!     Arc::new(WorkQueue::new("member-dns")),
//!     Arc::new(WorkQueue::new("member-entries")),
//! );
//!
//! let mut pool = WorkerPool::new(operations, sinks, WorkerPoolConfig::default())?;
//! pool.start()?;
//! // ... producers push operations ...
//! pool.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use groupderef_common::resilience::RateLimiter;
use groupderef_core::{DereferenceOperation, ExecutionOutcome, OperationQueue, RecordSinks};
use groupderef_domain::constants::{
    DEFAULT_JOIN_TIMEOUT_MS, DEFAULT_RATE_PER_SECOND, DEFAULT_WORKER_COUNT,
};
use groupderef_domain::{DereferenceConfig, DerefError, Result};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Sizing and pacing of the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Number of worker tasks
    pub worker_count: usize,
    /// Aggregate operations per second across all workers
    pub permits_per_second: u32,
    /// How long `stop` waits for each worker to finish
    pub join_timeout: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            permits_per_second: DEFAULT_RATE_PER_SECOND,
            join_timeout: Duration::from_millis(DEFAULT_JOIN_TIMEOUT_MS),
        }
    }
}

impl From<&DereferenceConfig> for WorkerPoolConfig {
    fn from(config: &DereferenceConfig) -> Self {
        Self {
            worker_count: config.worker_count,
            permits_per_second: config.effective_rate_per_second(),
            join_timeout: config.join_timeout(),
        }
    }
}

impl WorkerPoolConfig {
    fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(DerefError::Config("worker count must be at least 1".to_string()));
        }
        if self.join_timeout.is_zero() {
            return Err(DerefError::Config("join timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// Executed operations, counted by outcome.
#[derive(Debug, Default)]
pub struct WorkerStats {
    enqueued: AtomicU64,
    touched: AtomicU64,
    dropped: AtomicU64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: ExecutionOutcome) {
        let counter = match outcome {
            ExecutionOutcome::Enqueued => &self.enqueued,
            ExecutionOutcome::Touched => &self.touched,
            ExecutionOutcome::Dropped => &self.dropped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            touched: self.touched.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`WorkerStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WorkerStatsSnapshot {
    pub enqueued: u64,
    pub touched: u64,
    pub dropped: u64,
}

impl WorkerStatsSnapshot {
    /// Total operations executed, whatever the outcome.
    #[must_use]
    pub const fn executed(&self) -> u64 {
        self.enqueued + self.touched + self.dropped
    }
}

/// Fixed-size set of workers bound to one operation queue.
pub struct WorkerPool {
    queue: Arc<OperationQueue>,
    sinks: RecordSinks,
    config: WorkerPoolConfig,
    limiter: Arc<RateLimiter>,
    stats: Arc<WorkerStats>,
    cancellation: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Create a stopped pool.
    ///
    /// # Errors
    /// Returns `DerefError::Config` if the configuration is invalid.
    pub fn new(
        queue: Arc<OperationQueue>,
        sinks: RecordSinks,
        config: WorkerPoolConfig,
    ) -> Result<Self> {
        config.validate()?;
        let limiter = Arc::new(build_limiter(config.permits_per_second)?);

        Ok(Self {
            queue,
            sinks,
            config,
            limiter,
            stats: Arc::new(WorkerStats::new()),
            cancellation: CancellationToken::new(),
            handles: Vec::new(),
        })
    }

    /// Spawn the workers. Must be called within a tokio runtime.
    ///
    /// # Errors
    /// Returns `DerefError::InvalidState` if the pool is already running.
    #[instrument(skip(self), fields(workers = self.config.worker_count))]
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(DerefError::InvalidState("Worker pool already running".to_string()));
        }
        if !self.handles.is_empty() {
            debug!(exited = self.handles.len(), "Discarding handles of exited workers");
            self.handles.clear();
        }

        info!(queue = self.queue.name(), "Starting worker pool");

        self.cancellation = CancellationToken::new();
        self.handles = (0..self.config.worker_count)
            .map(|worker| {
                let queue = Arc::clone(&self.queue);
                let sinks = self.sinks.clone();
                let limiter = Arc::clone(&self.limiter);
                let stats = Arc::clone(&self.stats);
                let cancel = self.cancellation.clone();

                tokio::spawn(async move {
                    Self::worker_loop(worker, queue, sinks, limiter, stats, cancel).await;
                })
            })
            .collect();

        info!("Worker pool started");
        Ok(())
    }

    /// Signal every worker to stop and wait for them, up to the join
    /// timeout each.
    ///
    /// Workers that miss the deadline are left to finish on their own.
    ///
    /// # Errors
    /// Returns `DerefError::InvalidState` if no workers were started, or if
    /// a worker panicked or did not finish in time.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<()> {
        if self.handles.is_empty() {
            return Err(DerefError::InvalidState("Worker pool not running".to_string()));
        }

        info!("Stopping worker pool");
        self.cancellation.cancel();

        let join_timeout = self.config.join_timeout;
        let mut unfinished = 0_usize;
        for handle in self.handles.drain(..) {
            match tokio::time::timeout(join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Worker task panicked: {}", e);
                    unfinished += 1;
                }
                Err(_) => {
                    warn!(
                        timeout_ms = u64::try_from(join_timeout.as_millis()).unwrap_or(u64::MAX),
                        "Worker task did not complete within timeout"
                    );
                    unfinished += 1;
                }
            }
        }

        self.cancellation = CancellationToken::new();

        if unfinished > 0 {
            return Err(DerefError::InvalidState(format!(
                "{unfinished} worker(s) did not stop cleanly"
            )));
        }

        info!("Worker pool stopped");
        Ok(())
    }

    /// Apply a new configuration.
    ///
    /// A running pool is stopped and a fresh set of workers is started
    /// against the same queue with a newly built rate limiter. Queued
    /// operations stay queued; nothing is replayed. Returns whether the
    /// configuration changed.
    ///
    /// # Errors
    /// Returns `DerefError::Config` for an invalid configuration, or the
    /// error from restarting the workers.
    #[instrument(skip(self))]
    pub async fn reconfigure(&mut self, config: WorkerPoolConfig) -> Result<bool> {
        config.validate()?;
        if config == self.config {
            return Ok(false);
        }

        let limiter = Arc::new(build_limiter(config.permits_per_second)?);
        let was_running = self.is_running();
        if was_running {
            if let Err(e) = self.stop().await {
                warn!(error = %e, "Previous workers did not stop cleanly");
            }
        }

        self.config = config;
        self.limiter = limiter;

        if was_running {
            self.start()?;
        }

        info!(
            workers = config.worker_count,
            permits_per_second = config.permits_per_second,
            "Worker pool reconfigured"
        );
        Ok(true)
    }

    /// Returns true while at least one worker has not exited.
    ///
    /// Workers also exit on their own once the operation queue is closed.
    pub fn is_running(&self) -> bool {
        self.handles.iter().any(|handle| !handle.is_finished())
    }

    /// Workers that have not exited yet.
    pub fn active_workers(&self) -> usize {
        self.handles.iter().filter(|handle| !handle.is_finished()).count()
    }

    pub const fn config(&self) -> WorkerPoolConfig {
        self.config
    }

    pub fn stats(&self) -> WorkerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Shared limiter currently pacing the workers.
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    async fn worker_loop(
        worker: usize,
        queue: Arc<OperationQueue>,
        sinks: RecordSinks,
        limiter: Arc<RateLimiter>,
        stats: Arc<WorkerStats>,
        cancel: CancellationToken,
    ) {
        debug!(worker, "Worker started");
        loop {
            let operation = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(worker, "Worker loop cancelled");
                    break;
                }
                operation = next_operation(&queue, &limiter) => operation,
            };

            let Some(operation) = operation else {
                debug!(worker, queue = queue.name(), "Operation queue closed, worker exiting");
                break;
            };

            // Runs outside the select so cancellation never interrupts it.
            let outcome = operation.execute(&sinks).await;
            stats.record(outcome);
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("WorkerPool dropped while running; cancelling workers");
            self.cancellation.cancel();
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("queue", &self.queue.name())
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

async fn next_operation(
    queue: &OperationQueue,
    limiter: &RateLimiter,
) -> Option<DereferenceOperation> {
    limiter.acquire().await;
    queue.pop().await
}

fn build_limiter(permits_per_second: u32) -> Result<RateLimiter> {
    RateLimiter::per_second(permits_per_second).map_err(DerefError::Config)
}
