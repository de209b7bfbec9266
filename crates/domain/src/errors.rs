//! Error types used throughout the dereference pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for groupderef
///
/// Only configuration and lifecycle problems surface through this type.
/// Failures while executing a single dereference operation are logged and
/// counted, never returned to the producer or the host engine.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum DerefError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Capacity exceeded: {0}")]
    Capacity(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for groupderef operations
pub type Result<T> = std::result::Result<T, DerefError>;
