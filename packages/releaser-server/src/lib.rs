pub mod response;
pub mod routes;
pub mod server;
pub mod static_files;

pub use routes::AppState;
pub use server::{ReleaseServer, ServerHandle};
