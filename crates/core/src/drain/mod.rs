//! Pull-based adapters the downstream engine drains records through

pub mod ports;
pub mod sources;

pub use ports::ChangeSource;
pub use sources::{MemberDnSource, MemberEntrySource};
