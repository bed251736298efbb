//! Error types for remote fetches, row normalization and configuration.
//!
//! None of these reach the end user directly: the dashboard and list screens
//! degrade to zero counts / empty lists and log the error instead.

use std::path::PathBuf;
use thiserror::Error;

use crate::backend::Table;

/// A query against the hosted backend failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Table {0} unavailable")]
    Unavailable(Table),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// A raw row could not be turned into a typed entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("{kind} row is missing required field `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found at {0}. Create it with: {{ \"apiUrl\": \"https://your-project.example.com\" }}")]
    NotFound(PathBuf),

    #[error("Could not find home directory")]
    NoHomeDir,

    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
