//! Release metadata distribution: a JSON-file release store, the services
//! that publish and query it, and the HTTP server in front of them.

pub use releaser_config as config;
pub use releaser_core as core;
pub use releaser_server as server;
pub use releaser_store as store;
pub use releaser_utils as utils;

pub use releaser_config::Settings;
pub use releaser_core::{
    DeleteOutcome, ErrorKind, PublishRequest, ReleaseError, ReleaseRecord, ReleaseService,
    ReleaseStore,
};
pub use releaser_server::{ReleaseServer, ServerHandle};
pub use releaser_store::{FileStore, MemoryStore};
