//! # groupderef Core
//!
//! Dereference pipeline logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for directory access and downstream draining
//! - Dereference operations and the group change processor
//! - Drain adapters and the queue monitor
//!
//! ## Architecture Principles
//! - Depends only on `groupderef-domain` and `groupderef-common`
//! - Directory I/O goes through the [`DirectoryConnection`] trait
//! - Workers, configuration files and tracing setup live in `groupderef-infra`

pub mod dereference;
pub mod directory;
pub mod drain;
pub mod monitor;

pub use dereference::{
    synthesize_entry, DereferenceOperation, ExecutionOutcome, GroupChangeProcessor,
    GroupSyncDecision, OperationQueue, ProcessReport, RecordQueue, RecordSinks,
};
pub use directory::{ConnectionError, ConnectionHandle, DirectoryConnection};
pub use drain::{ChangeSource, MemberDnSource, MemberEntrySource};
pub use monitor::{DereferenceMonitor, MonitorSnapshot};
