//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading and validation
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty
    #[error("{0} must be set")]
    MissingVar(&'static str),

    /// PORT did not parse as a TCP port number
    #[error("invalid port: {0}")]
    InvalidPort(String),

    /// LOG_LEVEL is not a recognized level
    #[error("invalid log level: {0}. Valid values: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
