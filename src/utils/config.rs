use crate::utils::errors::{Result, TransferError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "imdb-transfer.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub checkpoint: CheckpointConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub graphql_endpoint: String,
    pub watchlist_endpoint: String,
    pub user_agent: String,
    /// Unset keeps the HTTP client's own behaviour.
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            graphql_endpoint: "https://api.graphql.imdb.com/".to_string(),
            watchlist_endpoint: "https://www.imdb.com/watchlist".to_string(),
            user_agent: concat!("imdb-transfer/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: None,
        }
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("done.json"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TransferError::ConfigError(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| TransferError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// An explicit path must load. Without one, the default file is used when present.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[checkpoint]\npath = \"state/progress.json\"").unwrap();

        let config = AppConfig::load_from_file(file.path()).unwrap();

        assert_eq!(config.checkpoint.path, PathBuf::from("state/progress.json"));
        assert_eq!(config.api.graphql_endpoint, "https://api.graphql.imdb.com/");
        assert_eq!(config.logging.level, "info");
        assert!(config.api.timeout_seconds.is_none());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        let err = AppConfig::load_or_default(Some(&missing)).unwrap_err();
        assert!(matches!(err, TransferError::ConfigError(_)));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\ntimeout_seconds = ").unwrap();

        assert!(AppConfig::load_from_file(file.path()).is_err());
    }
}
