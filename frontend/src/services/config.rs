//! # Client Configuration
//!
//! Settings are read from an optional YAML file:
//!
//! ```yaml
//! api_base_url: "http://192.168.1.20:5000"
//! conflict_draft_policy: keep
//! ```
//!
//! The `LOAN_BOOK_API_URL` environment variable overrides the file's base URL.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable that overrides `api_base_url`
pub const API_URL_ENV: &str = "LOAN_BOOK_API_URL";

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// What a registration screen does with its draft when the backend reports
/// that the account number is already taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictDraftPolicy {
    /// Keep the draft so the agent can correct the account number
    #[default]
    Keep,
    /// Reset the draft to its empty default
    Clear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the record-keeping API, without the `/api` suffix
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub conflict_draft_policy: ConflictDraftPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            conflict_draft_policy: ConflictDraftPolicy::default(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl ClientConfig {
    /// Load configuration from `path` (when it exists), then apply the
    /// environment override
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                info!("Config file {:?} not found, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.apply_api_url_override(&url);
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: ClientConfig = serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        debug!("Loaded client config from {:?}", path);
        Ok(config)
    }

    /// Replace the base URL unless `url` is blank
    pub fn apply_api_url_override(&mut self, url: &str) {
        let url = url.trim();
        if !url.is_empty() {
            debug!("API base URL overridden to {}", url);
            self.api_base_url = url.to_string();
        }
    }
}
