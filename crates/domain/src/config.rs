//! Dereference pipeline configuration
//!
//! Every key has a default, so an empty TOML/JSON document is a valid
//! configuration. Keys use the option spellings operators already know
//! (`max-group-size`, `skip-group-sync`, ...).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_JOIN_TIMEOUT_MS, DEFAULT_MEMBER_ATTRIBUTES, DEFAULT_RATE_PER_SECOND,
    DEFAULT_WORKER_COUNT,
};
use crate::errors::{DerefError, Result};
use crate::impl_option_conversions;

/// Which part of the group change is inspected for member references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParseMode {
    /// Read every current value of the watched attributes on the group.
    #[serde(rename = "parse-whole-group", alias = "whole-group")]
    WholeGroup,
    /// Read only the values named by the change itself.
    #[default]
    #[serde(rename = "parse-group-change", alias = "change-only")]
    ChangeOnly,
}

impl_option_conversions!(ParseMode {
    WholeGroup => "parse-whole-group" | "whole-group",
    ChangeOnly => "parse-group-change" | "change-only",
});

/// How a dereferenced member is propagated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strategy {
    /// Queue a record carrying the member DN only.
    #[default]
    #[serde(rename = "enqueue-member-dn", alias = "enqueue-dn")]
    EnqueueDn,
    /// Fetch the member entry and queue a record carrying the snapshot.
    #[serde(rename = "enqueue-member-entry", alias = "enqueue-full-entry")]
    EnqueueFullEntry,
    /// Issue a no-op write on the member so the source reports a change.
    #[serde(rename = "touch-member-entry", alias = "touch-write")]
    TouchWrite,
}

impl_option_conversions!(Strategy {
    EnqueueDn => "enqueue-member-dn" | "enqueue-dn",
    EnqueueFullEntry => "enqueue-member-entry" | "enqueue-full-entry",
    TouchWrite => "touch-member-entry" | "touch-write",
});

impl Strategy {
    /// Whether operations built with this strategy need a connection handle.
    #[must_use]
    pub const fn requires_connection(self) -> bool {
        matches!(self, Self::EnqueueFullEntry | Self::TouchWrite)
    }
}

/// Configuration of the dereference pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DereferenceConfig {
    /// Attributes carrying member references.
    #[serde(alias = "attribute")]
    pub attributes: Vec<String>,
    /// Groups holding at least this many references are skipped in
    /// whole-group mode. `None` means unbounded.
    pub max_group_size: Option<usize>,
    #[serde(alias = "number-of-threads")]
    pub worker_count: usize,
    /// Aggregate operations per second across all workers; `None` falls back
    /// to [`DEFAULT_RATE_PER_SECOND`].
    pub max_rate_per_second: Option<u32>,
    pub parse_mode: ParseMode,
    pub strategy: Strategy,
    /// Ask the host to stop ordinary propagation of the group entry itself.
    #[serde(alias = "skip-group-sync")]
    pub abort_group_sync: bool,
    /// Bound on the operation queue. `None` means unbounded.
    pub queue_capacity: Option<usize>,
    pub join_timeout_ms: u64,
    pub verbose: bool,
}

impl Default for DereferenceConfig {
    fn default() -> Self {
        Self {
            attributes: DEFAULT_MEMBER_ATTRIBUTES.iter().map(|s| (*s).to_string()).collect(),
            max_group_size: None,
            worker_count: DEFAULT_WORKER_COUNT,
            max_rate_per_second: None,
            parse_mode: ParseMode::default(),
            strategy: Strategy::default(),
            abort_group_sync: false,
            queue_capacity: None,
            join_timeout_ms: DEFAULT_JOIN_TIMEOUT_MS,
            verbose: false,
        }
    }
}

impl DereferenceConfig {
    /// Validate option values. Processing must not start on failure.
    ///
    /// # Errors
    /// Returns `DerefError::Config` naming the first offending option.
    pub fn validate(&self) -> Result<()> {
        if self.attributes.is_empty() {
            return Err(config_error("attributes must name at least one attribute"));
        }
        if self.attributes.iter().any(|a| a.trim().is_empty()) {
            return Err(config_error("attributes must not contain blank names"));
        }
        if self.max_group_size == Some(0) {
            return Err(config_error("max-group-size must be at least 1"));
        }
        if self.worker_count == 0 {
            return Err(config_error("worker-count must be at least 1"));
        }
        if self.max_rate_per_second == Some(0) {
            return Err(config_error("max-rate-per-second must be at least 1"));
        }
        if self.queue_capacity == Some(0) {
            return Err(config_error("queue-capacity must be at least 1"));
        }
        if self.join_timeout_ms == 0 {
            return Err(config_error("join-timeout-ms must be at least 1"));
        }
        Ok(())
    }

    /// Permits per second actually enforced by the rate limiter.
    #[must_use]
    pub fn effective_rate_per_second(&self) -> u32 {
        self.max_rate_per_second.unwrap_or(DEFAULT_RATE_PER_SECOND)
    }

    #[must_use]
    pub const fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    /// Whether `attribute` (base name, case-insensitive) is watched.
    #[must_use]
    pub fn watches(&self, attribute: &str) -> bool {
        crate::types::name_matches_any(attribute, &self.attributes)
    }
}

fn config_error(message: &str) -> DerefError {
    DerefError::Config(message.to_string())
}
