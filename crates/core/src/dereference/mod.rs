//! Dereferencing group changes into member work
//!
//! The [`GroupChangeProcessor`] extracts member references from a change and
//! queues one [`DereferenceOperation`] per reference. Workers later run each
//! operation exactly once against the [`RecordSinks`].

pub mod operation;
pub mod processor;
pub mod synthesis;

pub use operation::{
    touch_request, DereferenceOperation, ExecutionOutcome, OperationQueue, RecordQueue,
    RecordSinks,
};
pub use processor::{extract_member_values, GroupChangeProcessor, GroupSyncDecision, ProcessReport};
pub use synthesis::synthesize_entry;
