//! Drain adapters over the two record queues

use std::sync::Arc;

use async_trait::async_trait;
use groupderef_domain::constants::{MEMBER_DN_ENDPOINT, MEMBER_ENTRY_ENDPOINT};
use groupderef_domain::{ChangeRecord, Entry};
use tracing::{debug, trace};

use super::ports::ChangeSource;
use crate::dereference::RecordQueue;
use crate::directory::{ConnectionError, ConnectionHandle};

fn drain(queue: &RecordQueue, max_items: usize) -> Vec<ChangeRecord> {
    let batch = queue.pop_batch(max_items);
    if !batch.is_empty() {
        trace!(queue = queue.name(), polled = batch.len(), remaining = queue.len(), "records polled");
    }
    batch
}

/// Source of identifier-only records.
///
/// Entries are re-read from an external directory when the host asks for
/// them, using the record's `DN` property.
pub struct MemberDnSource {
    queue: Arc<RecordQueue>,
    directory: Option<ConnectionHandle>,
}

impl MemberDnSource {
    pub fn new(queue: Arc<RecordQueue>) -> Self {
        Self { queue, directory: None }
    }

    /// Directory used by [`ChangeSource::fetch_entry`].
    #[must_use]
    pub fn with_directory(mut self, directory: ConnectionHandle) -> Self {
        self.directory = Some(directory);
        self
    }
}

#[async_trait]
impl ChangeSource for MemberDnSource {
    fn endpoint_url(&self) -> &'static str {
        MEMBER_DN_ENDPOINT
    }

    fn poll_batch(&self, max_items: usize) -> Vec<ChangeRecord> {
        drain(&self.queue, max_items)
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }

    async fn fetch_entry(&self, record: &ChangeRecord) -> Result<Option<Entry>, ConnectionError> {
        let Some(directory) = self.directory.as_ref() else {
            return Err(ConnectionError::Unavailable(
                "no external directory configured for member lookups".to_string(),
            ));
        };

        let dn = record.dn_property().unwrap_or(record.target_dn.as_str());
        match directory.fetch_entry(dn).await {
            Ok(entry) => Ok(Some(entry)),
            Err(ConnectionError::NoSuchEntry(_)) => {
                debug!(member = dn, "member entry no longer exists");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for MemberDnSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberDnSource")
            .field("queue", &self.queue)
            .field("has_directory", &self.directory.is_some())
            .finish()
    }
}

/// Source of records carrying a member snapshot. No I/O.
#[derive(Debug)]
pub struct MemberEntrySource {
    queue: Arc<RecordQueue>,
}

impl MemberEntrySource {
    pub fn new(queue: Arc<RecordQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl ChangeSource for MemberEntrySource {
    fn endpoint_url(&self) -> &'static str {
        MEMBER_ENTRY_ENDPOINT
    }

    fn poll_batch(&self, max_items: usize) -> Vec<ChangeRecord> {
        drain(&self.queue, max_items)
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }

    async fn fetch_entry(&self, record: &ChangeRecord) -> Result<Option<Entry>, ConnectionError> {
        Ok(record.full_entry().cloned())
    }
}
