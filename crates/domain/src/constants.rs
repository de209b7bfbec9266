//! Domain constants
//!
//! Defaults and well-known names shared by every layer of the pipeline.

// Configuration defaults
pub const DEFAULT_MEMBER_ATTRIBUTES: [&str; 2] = ["member", "uniqueMember"];
pub const DEFAULT_WORKER_COUNT: usize = 1;
pub const DEFAULT_RATE_PER_SECOND: u32 = 1000;
pub const DEFAULT_JOIN_TIMEOUT_MS: u64 = 5_000;

// Change records
pub const DN_PROPERTY: &str = "DN";

// Touch mutation: delete then re-add a value every entry carries
pub const TOUCH_ATTRIBUTE: &str = "objectClass";
pub const TOUCH_VALUE: &str = "top";

// Drain adapter endpoints
pub const MEMBER_DN_ENDPOINT: &str = "/ldap/member";
pub const MEMBER_ENTRY_ENDPOINT: &str = "/groupMembers";

// Queue names used in logs and metrics
pub const OPERATION_QUEUE_NAME: &str = "dereference-operations";
pub const MEMBER_DN_QUEUE_NAME: &str = "member-dns";
pub const MEMBER_ENTRY_QUEUE_NAME: &str = "member-entries";
