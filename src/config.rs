//! Runtime configuration, loaded from `~/.crm-dashboard/config.json`.
//!
//! Only `apiUrl` is required; everything else has a default. `CRM_API_URL`
//! and `CRM_API_KEY` override the file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{MalformedRowPolicy, NormalizePolicy};

/// Upper bound on recent activities shown on the dashboard.
pub const MAX_RECENT_ACTIVITIES: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the hosted backend, e.g. `https://abc.supabase.co`.
    pub api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub malformed_rows: MalformedRowPolicy,
    /// Substituted for a missing name/title when `malformedRows` is `fallback`.
    #[serde(default = "default_fallback_label")]
    pub fallback_label: String,
    /// Shown for a recent activity with no linked client.
    #[serde(default = "default_client_placeholder")]
    pub client_placeholder: String,
    #[serde(default = "default_recent_activity_limit")]
    pub recent_activity_limit: usize,
    /// Calls slower than this are logged as over budget.
    #[serde(default = "default_latency_budget_ms")]
    pub latency_budget_ms: u64,
}

fn default_fallback_label() -> String {
    "Untitled".to_string()
}

fn default_client_placeholder() -> String {
    "Client not specified".to_string()
}

fn default_recent_activity_limit() -> usize {
    MAX_RECENT_ACTIVITIES
}

fn default_latency_budget_ms() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: None,
            malformed_rows: MalformedRowPolicy::default(),
            fallback_label: default_fallback_label(),
            client_placeholder: default_client_placeholder(),
            recent_activity_limit: default_recent_activity_limit(),
            latency_budget_ms: default_latency_budget_ms(),
        }
    }
}

impl Config {
    pub fn normalize_policy(&self) -> NormalizePolicy {
        NormalizePolicy {
            malformed_rows: self.malformed_rows,
            fallback_label: self.fallback_label.clone(),
        }
    }

    /// Recent-activity limit clamped to `1..=MAX_RECENT_ACTIVITIES`.
    pub fn recent_limit(&self) -> usize {
        self.recent_activity_limit.clamp(1, MAX_RECENT_ACTIVITIES)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(self.api_url.trim())
            .map_err(|e| ConfigError::Invalid(format!("apiUrl '{}': {}", self.api_url, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::Invalid(format!(
                "apiUrl must be http(s), got '{}'",
                other
            ))),
        }
    }

    /// Apply `CRM_API_URL` / `CRM_API_KEY` if set and non-empty.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var("CRM_API_URL").ok(),
            std::env::var("CRM_API_KEY").ok(),
        )
    }

    fn with_overrides(mut self, api_url: Option<String>, api_key: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|s| !s.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(key) = api_key.filter(|s| !s.trim().is_empty()) {
            self.api_key = Some(key);
        }
        self
    }
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".crm-dashboard").join("config.json"))
}

/// Load, apply env overrides, and validate.
pub fn load_config() -> Result<Config, ConfigError> {
    let config = load_config_from(&config_path()?)?.with_env_overrides();
    config.validate()?;
    Ok(config)
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    if config.recent_activity_limit != config.recent_limit() {
        log::warn!(
            "recentActivityLimit {} out of range, using {}",
            config.recent_activity_limit,
            config.recent_limit()
        );
    }
    Ok(config)
}
