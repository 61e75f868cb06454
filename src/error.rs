// Error types module

use std::fmt;

/// Centralized error type for the application
///
/// Categorizes errors into 3 main types for better debugging,
/// monitoring, and appropriate HTTP status code mapping.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Configuration errors (invalid YAML, missing env vars, etc.)
    Config(String),

    /// Upstream errors that survived the fallback tiers (no stale data,
    /// no substitute configured)
    Upstream(String),

    /// Internal errors (serialization failure, unexpected state)
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
