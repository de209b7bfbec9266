//! Pipeline context wiring producer, queues, workers and drain adapters.
//!
//! One [`DereferencePipeline`] is built at startup and shared with the host
//! engine. It owns the single operation queue and the two record queues,
//! so every producer call and every worker sees the same instances.

use std::sync::Arc;

use groupderef_common::sync::{QueueConfig, WorkQueue};
use groupderef_core::{
    ConnectionHandle, DereferenceMonitor, GroupChangeProcessor, GroupSyncDecision,
    MemberDnSource, MemberEntrySource, OperationQueue, RecordQueue, RecordSinks,
};
use groupderef_domain::constants::{
    MEMBER_DN_QUEUE_NAME, MEMBER_ENTRY_QUEUE_NAME, OPERATION_QUEUE_NAME,
};
use groupderef_domain::{ChangeEvent, DereferenceConfig, DerefError, Result};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::workers::{WorkerPool, WorkerPoolConfig, WorkerStatsSnapshot};

/// Process-wide dereference pipeline.
pub struct DereferencePipeline {
    config: RwLock<DereferenceConfig>,
    operations: Arc<OperationQueue>,
    sinks: RecordSinks,
    processor: GroupChangeProcessor,
    monitor: DereferenceMonitor,
    workers: Mutex<WorkerPool>,
    external_directory: Option<ConnectionHandle>,
}

impl DereferencePipeline {
    /// Build the queues, processor and (stopped) worker pool.
    ///
    /// # Errors
    /// Returns `DerefError::Config` if `config` is invalid.
    pub fn new(config: DereferenceConfig) -> Result<Self> {
        config.validate()?;

        let queue_config = match config.queue_capacity {
            Some(capacity) => QueueConfig::bounded(OPERATION_QUEUE_NAME, capacity),
            None => QueueConfig::unbounded(OPERATION_QUEUE_NAME),
        };
        let operations = Arc::new(
            WorkQueue::with_config(queue_config).map_err(|e| DerefError::Config(e.to_string()))?,
        );
        let member_dns: Arc<RecordQueue> = Arc::new(WorkQueue::new(MEMBER_DN_QUEUE_NAME));
        let member_entries: Arc<RecordQueue> = Arc::new(WorkQueue::new(MEMBER_ENTRY_QUEUE_NAME));

        let sinks = RecordSinks::new(Arc::clone(&member_dns), Arc::clone(&member_entries));
        let monitor =
            DereferenceMonitor::new(Arc::clone(&operations), member_dns, member_entries);
        let processor = GroupChangeProcessor::new(Arc::clone(&operations));
        let workers = WorkerPool::new(
            Arc::clone(&operations),
            sinks.clone(),
            WorkerPoolConfig::from(&config),
        )?;

        Ok(Self {
            config: RwLock::new(config),
            operations,
            sinks,
            processor,
            monitor,
            workers: Mutex::new(workers),
            external_directory: None,
        })
    }

    /// Directory the DN drain adapter re-reads members from.
    #[must_use]
    pub fn with_external_directory(mut self, directory: ConnectionHandle) -> Self {
        self.external_directory = Some(directory);
        self
    }

    /// Start the workers.
    ///
    /// # Errors
    /// Returns `DerefError::InvalidState` if already started or shut down.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        if self.operations.is_closed() {
            return Err(DerefError::InvalidState("Pipeline has been shut down".to_string()));
        }
        self.workers.lock().await.start()?;
        info!("Dereference pipeline started");
        Ok(())
    }

    /// Handle one detected change on a group entry.
    ///
    /// Enqueues one operation per member reference and returns whether the
    /// host should stop ordinary propagation of the group entry itself.
    pub fn on_group_change(
        &self,
        event: &ChangeEvent,
        attachment: Option<&ConnectionHandle>,
    ) -> GroupSyncDecision {
        let config = self.config.read();
        self.processor.process(event, &config, attachment).decision
    }

    /// Validate and apply a new configuration.
    ///
    /// The workers are restarted when their count, rate or join timeout
    /// changes. Queue capacity is fixed at construction; a different value
    /// is ignored with a warning.
    ///
    /// # Errors
    /// Returns `DerefError::Config` for an invalid configuration, which is
    /// then not applied.
    #[instrument(skip_all)]
    pub async fn apply_config(&self, config: DereferenceConfig) -> Result<()> {
        config.validate()?;

        let mut config = config;
        let current_capacity = self.config.read().queue_capacity;
        if config.queue_capacity != current_capacity {
            warn!(
                requested = ?config.queue_capacity,
                current = ?current_capacity,
                "Queue capacity is fixed at construction; keeping the current value"
            );
            config.queue_capacity = current_capacity;
        }

        let restarted =
            self.workers.lock().await.reconfigure(WorkerPoolConfig::from(&config)).await?;
        *self.config.write() = config;

        info!(workers_restarted = restarted, "Configuration applied");
        Ok(())
    }

    /// Configuration currently in effect.
    pub fn config(&self) -> DereferenceConfig {
        self.config.read().clone()
    }

    /// Drain adapter for identifier-only records.
    pub fn member_dn_source(&self) -> MemberDnSource {
        let source = MemberDnSource::new(Arc::clone(&self.sinks.member_dns));
        match &self.external_directory {
            Some(directory) => source.with_directory(Arc::clone(directory)),
            None => source,
        }
    }

    /// Drain adapter for records carrying a fetched entry.
    pub fn member_entry_source(&self) -> MemberEntrySource {
        MemberEntrySource::new(Arc::clone(&self.sinks.member_entries))
    }

    pub const fn monitor(&self) -> &DereferenceMonitor {
        &self.monitor
    }

    pub async fn worker_stats(&self) -> WorkerStatsSnapshot {
        self.workers.lock().await.stats()
    }

    pub async fn is_running(&self) -> bool {
        self.workers.lock().await.is_running()
    }

    /// Stop the workers, then close the operation queue.
    ///
    /// Records already produced stay available to the drain adapters.
    ///
    /// # Errors
    /// Returns the error from stopping the workers; the queue is closed
    /// regardless.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<()> {
        let mut workers = self.workers.lock().await;
        let stopped = if workers.is_running() { workers.stop().await } else { Ok(()) };

        self.operations.close();
        let pending = self.operations.len();
        if pending > 0 {
            warn!(pending, "Operations left unexecuted at shutdown");
        }

        info!("Dereference pipeline shut down");
        stopped
    }
}

impl std::fmt::Debug for DereferencePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DereferencePipeline")
            .field("config", &*self.config.read())
            .field("operations", &self.operations.len())
            .field("external_directory", &self.external_directory.is_some())
            .finish_non_exhaustive()
    }
}
