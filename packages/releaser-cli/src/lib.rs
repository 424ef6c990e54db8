pub mod admin;
pub mod logging;

pub use admin::AdminConsole;
