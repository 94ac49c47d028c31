use crate::utils::{Result, TransferError};
use reqwest::header::HeaderValue;
use std::path::Path;

/// Cookie header value of the destination account. Only ever held in memory.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TransferError::CredentialError(format!(
                "Failed to read destination IMDb cookie file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let cookie: String = raw.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        let cookie = cookie.trim();

        if cookie.is_empty() {
            return Err(TransferError::CredentialError("cookie is empty".to_string()));
        }
        if HeaderValue::from_str(cookie).is_err() {
            return Err(TransferError::CredentialError(
                "cookie contains characters not allowed in an HTTP header".to_string(),
            ));
        }

        Ok(Self(cookie.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
