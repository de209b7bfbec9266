//! Dereference operations: one unit of work per member reference

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use groupderef_common::sync::WorkQueue;
use groupderef_domain::constants::{TOUCH_ATTRIBUTE, TOUCH_VALUE};
use groupderef_domain::{
    ChangeRecord, DerefError, MemberReference, Modification, ModifyRequest, Result, Strategy,
};
use tracing::{debug, error, warn};

use crate::directory::ConnectionHandle;

/// Queue of pending dereference operations.
pub type OperationQueue = WorkQueue<DereferenceOperation>;

/// Queue of change records waiting for the downstream engine.
pub type RecordQueue = WorkQueue<ChangeRecord>;

/// Downstream queues that executed operations feed.
#[derive(Debug, Clone)]
pub struct RecordSinks {
    /// Identifier-only records
    pub member_dns: Arc<RecordQueue>,
    /// Records carrying a fetched entry snapshot
    pub member_entries: Arc<RecordQueue>,
}

impl RecordSinks {
    pub fn new(member_dns: Arc<RecordQueue>, member_entries: Arc<RecordQueue>) -> Self {
        Self { member_dns, member_entries }
    }
}

/// What happened when an operation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionOutcome {
    /// A change record was pushed downstream.
    Enqueued,
    /// The touch write was applied at the source.
    Touched,
    /// The operation failed and was discarded.
    Dropped,
}

/// How to propagate one member reference.
///
/// Variants that talk to the directory hold their connection, so an
/// operation cannot exist without what it needs to run.
pub enum DereferenceOperation {
    /// Push an identifier-only record to the DN queue.
    EnqueueReference { reference: MemberReference },
    /// Fetch the member and push its snapshot to the entry queue.
    EnqueueFullEntry { reference: MemberReference, connection: ConnectionHandle },
    /// Delete and re-add a marker value on the member at the source.
    TouchWrite { reference: MemberReference, connection: ConnectionHandle },
}

impl DereferenceOperation {
    pub const fn enqueue_reference(reference: MemberReference) -> Self {
        Self::EnqueueReference { reference }
    }

    /// # Errors
    /// `DerefError::MissingPrerequisite` when `connection` is `None`.
    pub fn enqueue_full_entry(
        reference: MemberReference,
        connection: Option<ConnectionHandle>,
    ) -> Result<Self> {
        let connection = require_connection(connection, &reference, Strategy::EnqueueFullEntry)?;
        Ok(Self::EnqueueFullEntry { reference, connection })
    }

    /// # Errors
    /// `DerefError::MissingPrerequisite` when `connection` is `None`.
    pub fn touch_write(
        reference: MemberReference,
        connection: Option<ConnectionHandle>,
    ) -> Result<Self> {
        let connection = require_connection(connection, &reference, Strategy::TouchWrite)?;
        Ok(Self::TouchWrite { reference, connection })
    }

    /// Build the operation `strategy` calls for.
    ///
    /// # Errors
    /// `DerefError::MissingPrerequisite` when the strategy needs a connection
    /// and none is given.
    pub fn for_strategy(
        strategy: Strategy,
        reference: MemberReference,
        connection: Option<&ConnectionHandle>,
    ) -> Result<Self> {
        match strategy {
            Strategy::EnqueueDn => Ok(Self::enqueue_reference(reference)),
            Strategy::EnqueueFullEntry => Self::enqueue_full_entry(reference, connection.cloned()),
            Strategy::TouchWrite => Self::touch_write(reference, connection.cloned()),
        }
    }

    pub const fn reference(&self) -> &MemberReference {
        match self {
            Self::EnqueueReference { reference }
            | Self::EnqueueFullEntry { reference, .. }
            | Self::TouchWrite { reference, .. } => reference,
        }
    }

    pub const fn strategy(&self) -> Strategy {
        match self {
            Self::EnqueueReference { .. } => Strategy::EnqueueDn,
            Self::EnqueueFullEntry { .. } => Strategy::EnqueueFullEntry,
            Self::TouchWrite { .. } => Strategy::TouchWrite,
        }
    }

    /// Run the operation once.
    ///
    /// Never fails: errors are logged and reported as
    /// [`ExecutionOutcome::Dropped`]. Nothing is retried.
    pub async fn execute(self, sinks: &RecordSinks) -> ExecutionOutcome {
        match self {
            Self::EnqueueReference { reference } => {
                let record = ChangeRecord::for_reference(&reference, Utc::now());
                push_record(&sinks.member_dns, record, &reference)
            }
            Self::EnqueueFullEntry { reference, connection } => {
                match connection.fetch_entry(reference.as_str()).await {
                    Ok(entry) => {
                        let record = ChangeRecord::for_entry(&reference, entry, Utc::now());
                        push_record(&sinks.member_entries, record, &reference)
                    }
                    Err(err) => {
                        error!(member = %reference, error = %err, "failed to fetch member entry");
                        ExecutionOutcome::Dropped
                    }
                }
            }
            Self::TouchWrite { reference, connection } => {
                let request = touch_request(&reference);
                match connection.modify(&request).await {
                    Ok(()) => {
                        debug!(member = %reference, "member entry touched");
                        ExecutionOutcome::Touched
                    }
                    Err(err) => {
                        warn!(member = %reference, error = %err, "failed to touch member entry");
                        ExecutionOutcome::Dropped
                    }
                }
            }
        }
    }
}

impl fmt::Debug for DereferenceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DereferenceOperation")
            .field("strategy", &self.strategy())
            .field("reference", self.reference())
            .finish()
    }
}

/// No-op write: remove the marker value, then add it back, in one request.
pub fn touch_request(reference: &MemberReference) -> ModifyRequest {
    ModifyRequest {
        dn: reference.as_str().to_string(),
        modifications: vec![
            Modification::delete(TOUCH_ATTRIBUTE, [TOUCH_VALUE]),
            Modification::add(TOUCH_ATTRIBUTE, [TOUCH_VALUE]),
        ],
    }
}

fn require_connection(
    connection: Option<ConnectionHandle>,
    reference: &MemberReference,
    strategy: Strategy,
) -> Result<ConnectionHandle> {
    connection.ok_or_else(|| {
        DerefError::MissingPrerequisite(format!(
            "{strategy} needs a directory connection to dereference {reference}"
        ))
    })
}

fn push_record(
    queue: &RecordQueue,
    record: ChangeRecord,
    reference: &MemberReference,
) -> ExecutionOutcome {
    match queue.push(record) {
        Ok(()) => {
            debug!(member = %reference, queue = queue.name(), "change record queued");
            ExecutionOutcome::Enqueued
        }
        Err(err) => {
            warn!(member = %reference, queue = queue.name(), error = %err, "change record dropped");
            ExecutionOutcome::Dropped
        }
    }
}
