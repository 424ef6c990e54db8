pub mod request;
pub mod service;

pub use request::{PublishRequest, MISSING_FIELDS_MESSAGE};
pub use service::{DeleteOutcome, ReleaseService, ADMIN_PLATFORMS};

// Re-export the store surface so callers only need this crate
pub use releaser_store::{
    ErrorKind, FileStore, MemoryStore, ReleaseError, ReleaseRecord, ReleaseStore, Result,
};
