//! Core error types for punch-reminder-core.
//!
//! Transient environmental failures (location, usage queries, launches) are
//! logged and degrade a single cycle; only configuration errors are ever
//! returned to the caller of `start`/`reload_config`.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for punch-reminder-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Location acquisition errors
    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    /// Errors raised by platform collaborators
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Location-specific errors.
#[derive(Error, Debug)]
pub enum LocationError {
    /// Provider is disabled or unknown
    #[error("Location provider '{0}' is not available")]
    ProviderUnavailable(String),

    /// Issuing the request failed
    #[error("Location request to '{provider}' failed: {message}")]
    RequestFailed { provider: String, message: String },
}

/// Errors from usage-signal and launcher collaborators.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Usage statistics could not be queried
    #[error("Usage query for '{app_id}' failed: {message}")]
    UsageQuery { app_id: String, message: String },

    /// App could not be launched
    #[error("Failed to launch '{app_id}': {message}")]
    Launch { app_id: String, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
