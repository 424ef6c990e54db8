pub mod settings;

pub use settings::{Settings, CONFIG_FILE_NAME, DEFAULT_PORT};
