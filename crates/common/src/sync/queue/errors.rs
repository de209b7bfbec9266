use thiserror::Error;

/// Queue operation errors
///
/// A failed push drops the item; callers count the failure and move on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Queue is at maximum capacity ({0})")]
    CapacityExceeded(usize),

    #[error("Queue is closed")]
    Closed,

    #[error("Invalid queue configuration: {0}")]
    InvalidConfig(String),
}

impl QueueError {
    /// Whether retrying the same push later could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::CapacityExceeded(_))
    }
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
