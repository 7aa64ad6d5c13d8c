//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Budget must be a non-negative number, got {0}")]
    InvalidBudget(f64),

    #[error("Minimum ROI must be a non-negative percentage, got {0}")]
    InvalidMinRoi(f64),

    #[error("Overrun penalty must be positive, got {0}")]
    InvalidOverrunPenalty(f64),

    #[error("{solver}: time limit must be positive")]
    InvalidTimeLimit { solver: &'static str },

    #[error("{solver}: MIP gap must lie in [0, 1), got {value}")]
    InvalidMipGap { solver: &'static str, value: f64 },

    #[error("{solver}: fallback executable {path} is not a file path")]
    InvalidExecutable { solver: &'static str, path: PathBuf },

    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Unknown log level '{0}'")]
    InvalidLogLevel(String),
}
