//! Remote project settings, loaded from a JSON file and overridable from the CLI.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_STORAGE_URL: &str = "https://firebasestorage.googleapis.com/v0";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing config value: {0}")]
    Missing(&'static str),
}

/// Connection settings for the hosted document, identity, and blob services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub project_id: String,
    pub api_key: String,
    pub storage_bucket: String,
    pub firestore_url: String,
    pub identity_url: String,
    pub storage_url: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            api_key: String::new(),
            storage_bucket: String::new(),
            firestore_url: DEFAULT_FIRESTORE_URL.to_string(),
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            storage_url: DEFAULT_STORAGE_URL.to_string(),
        }
    }
}

impl ConsoleConfig {
    /// Read a config file. Absent keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        tracing::debug!(path = %path.display(), project = %config.project_id, "loaded config");
        Ok(config)
    }

    /// The fields every remote backend needs.
    pub fn validate_remote(&self) -> Result<(), ConfigError> {
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::Missing("project_id"));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("api_key"));
        }
        Ok(())
    }

    /// Bucket name, falling back to the project's default bucket.
    pub fn bucket(&self) -> String {
        if self.storage_bucket.trim().is_empty() {
            format!("{}.appspot.com", self.project_id)
        } else {
            self.storage_bucket.clone()
        }
    }

    /// Base path of the default database's document tree.
    pub fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.firestore_url.trim_end_matches('/'),
            self.project_id
        )
    }
}
