//! Error types for the vitals service
//!
//! Provides structured error types for configuration, I/O and health check operations.

use thiserror::Error;
use vitals_core::{EngineError, RegistryError};

/// Main error type for service operations
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Invalid input data or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Semantically invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    FileError(String),

    /// Configuration parsing error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Ambiguous probe set
    #[error("Invalid probe set: {0}")]
    Registry(#[from] RegistryError),

    /// Evaluation cycle failed
    #[error("Health check failed: {0}")]
    Engine(#[from] EngineError),

    /// Listener or server failure
    #[error("Server error: {0}")]
    ServerError(String),
}

impl ServiceError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ServiceError::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        ServiceError::ConfigError(msg.into())
    }

    /// Check if this is a user-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidInput(_)
                | ServiceError::ConfigError(_)
                | ServiceError::FileError(_)
                | ServiceError::ParseError(_)
                | ServiceError::Registry(_)
        )
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::FileError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::ParseError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for ServiceError {
    fn from(err: serde_yaml::Error) -> Self {
        ServiceError::ParseError(format!("YAML error: {}", err))
    }
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;
