pub mod time;
pub mod versioning;

// Re-export main utilities
pub use time::{format_local, now_iso};
pub use versioning::{compare_versions, compare_versions_desc, VersionKey};
