//! Error types shared across the engine.
//!
//! A single [`DealscopeError`] enum covers the failure categories the
//! engine distinguishes: invalid caller input, unknown currency codes,
//! rejected overrides, missing deals, and degraded external
//! collaborators. External degradation (FX refresh, tariff lookup,
//! persistence) is generally *not* surfaced through this type, since
//! those paths fall back to tables and log instead, but the variants
//! exist for collaborator implementations to return.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DealscopeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),
    #[error("invalid override: {0}")]
    InvalidOverride(String),
    #[error("deal not found: {0}")]
    DealNotFound(String),
    #[error("data error: {0}")]
    DataError(String),
    #[error("tariff lookup error: {0}")]
    TariffError(String),
    #[error("storage error: {0}")]
    StorageError(String),
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("other error: {0}")]
    Other(String),
}

impl From<std::io::Error> for DealscopeError {
    fn from(err: std::io::Error) -> Self {
        DealscopeError::Other(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for DealscopeError {
    fn from(err: serde_json::Error) -> Self {
        DealscopeError::DataError(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for DealscopeError {
    fn from(err: reqwest::Error) -> Self {
        DealscopeError::DataError(format!("HTTP request error: {}", err))
    }
}

impl From<toml::de::Error> for DealscopeError {
    fn from(err: toml::de::Error) -> Self {
        DealscopeError::ConfigError(format!("TOML parse error: {}", err))
    }
}

impl From<url::ParseError> for DealscopeError {
    fn from(err: url::ParseError) -> Self {
        DealscopeError::ConfigError(format!("URL parse error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, DealscopeError>;
