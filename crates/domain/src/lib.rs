//! # groupderef Domain
//!
//! Data model for fanning group membership changes out to member entries.
//!
//! This crate contains:
//! - Directory entries, attributes and change events
//! - Member references and the change records produced for them
//! - Pipeline configuration
//! - Domain error type and Result definition
//!
//! ## Architecture
//! - No dependencies on other groupderef crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
