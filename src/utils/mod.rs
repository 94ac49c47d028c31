pub mod config;
pub mod errors;

pub use config::{ApiConfig, AppConfig, CheckpointConfig, LoggingConfig, DEFAULT_CONFIG_FILE};
pub use errors::{Result, TransferError};
