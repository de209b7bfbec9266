//! Domain types and models

pub mod change;
pub mod entry;
pub mod record;
pub mod reference;

pub use change::{ChangeDetail, ChangeEvent, ChangeKind, Modification, ModificationKind, ModifyRequest};
pub use entry::{base_name, name_matches_any, Attribute, Entry};
pub use record::{ChangeRecord, RecordPayload};
pub use reference::MemberReference;
