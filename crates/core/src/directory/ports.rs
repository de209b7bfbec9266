//! Port interfaces for directory access

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use groupderef_domain::{Entry, ModifyRequest};
use thiserror::Error;

/// Failure reported by a directory connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("No such entry: {0}")]
    NoSuchEntry(String),

    #[error("Directory unavailable: {0}")]
    Unavailable(String),

    #[error("Directory operation failed (result code {code}): {message}")]
    Operation { code: i32, message: String },

    #[error("Directory operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Connection to the directory a change was detected on.
///
/// Implementations own their timeouts; the pipeline never adds one.
#[async_trait]
pub trait DirectoryConnection: Send + Sync {
    /// Read an entry with all of its attributes.
    async fn fetch_entry(&self, dn: &str) -> Result<Entry, ConnectionError>;

    /// Apply a modify request.
    async fn modify(&self, request: &ModifyRequest) -> Result<(), ConnectionError>;
}

/// Shared handle to a directory connection, as attached to a change.
pub type ConnectionHandle = Arc<dyn DirectoryConnection>;
