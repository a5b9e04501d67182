//! Error taxonomy

use thiserror::Error;

/// An external capability call failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("{0} unreachable")]
    Unreachable(String),
    #[error("{0} rejected the request")]
    Rejected(String),
}

/// register() could not subscribe to sample delivery
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("no linear acceleration sensor available")]
    SensorUnavailable,
    #[error("sensor subscription failed: {0}")]
    SubscribeFailed(#[from] CapabilityError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("unrecognized event: {0:?}")]
    Unrecognized(String),
    #[error("invalid number {value:?} in {line:?}")]
    InvalidNumber { line: String, value: String },
    #[error("invalid JSON event: {0}")]
    Json(String),
}
