//! Error types shared across Tempest crates.

use thiserror::Error;

/// Top-level error type for Tempest tooling (config files, reports).
#[derive(Debug, Error)]
pub enum TempestError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse errors
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for Tempest operations.
pub type TempestResult<T> = Result<T, TempestError>;
