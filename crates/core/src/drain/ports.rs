//! Port interface the downstream batch engine pulls from

use async_trait::async_trait;
use groupderef_domain::{ChangeRecord, Entry};

use crate::directory::ConnectionError;

/// Pull-based source of change records.
///
/// The host engine calls [`poll_batch`](Self::poll_batch) on its own
/// schedule; nothing here ever waits for new records.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// Endpoint the host reports for records from this source.
    fn endpoint_url(&self) -> &'static str;

    /// Remove and return up to `max_items` records. Empty when nothing is
    /// queued.
    fn poll_batch(&self, max_items: usize) -> Vec<ChangeRecord>;

    /// Records still waiting to be polled.
    fn pending(&self) -> usize;

    /// Current state of the entry a record refers to; `None` when it no
    /// longer exists.
    async fn fetch_entry(&self, record: &ChangeRecord) -> Result<Option<Entry>, ConnectionError>;
}
