pub mod config;
pub mod types;

pub use self::config::{LiveConfig, load_config};
