//! Export configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings for one export/upload run. Missing JSON fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Written to `asset.generator`.
    pub generator: String,
    /// Absolute storage URL rewritten to a portable token on export.
    pub storage_provider_url: Option<String>,
    /// Pretty-print the encoded document.
    pub pretty: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            generator: "vefr.SceneExporter".to_string(),
            storage_provider_url: None,
            pretty: true,
        }
    }
}

impl ExportConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn with_storage_provider_url(mut self, url: impl Into<String>) -> Self {
        self.storage_provider_url = Some(url.into());
        self
    }
}
