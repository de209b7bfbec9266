use serde::{Deserialize, Serialize};

use super::errors::{QueueError, QueueResult};

/// Work queue configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Name used in logs and monitor output
    pub name: String,
    /// Maximum number of queued items; `None` means unbounded
    pub max_capacity: Option<usize>,
}

impl QueueConfig {
    /// Unbounded queue named `name`.
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self { name: name.into(), max_capacity: None }
    }

    /// Queue named `name` holding at most `capacity` items.
    pub fn bounded(name: impl Into<String>, capacity: usize) -> Self {
        Self { name: name.into(), max_capacity: Some(capacity) }
    }

    /// Validate configuration
    ///
    /// # Errors
    /// Returns `QueueError::InvalidConfig` for a blank name or a zero capacity.
    pub fn validate(&self) -> QueueResult<()> {
        if self.name.trim().is_empty() {
            return Err(QueueError::InvalidConfig("name must not be empty".to_string()));
        }
        if self.max_capacity == Some(0) {
            return Err(QueueError::InvalidConfig(
                "max_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
