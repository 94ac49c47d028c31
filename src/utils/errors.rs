use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Credential error: {0}")]
    CredentialError(String),

    #[error("Checkpoint error: {0}")]
    CheckpointError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to authenticate with cookie: {0}")]
    AuthenticationFailed(String),
}

pub type Result<T> = std::result::Result<T, TransferError>;
