//! Unified error hierarchy
//!
//! The calculation core itself never fails: missing or implausible inputs
//! degrade to "no contribution". Errors here come from the edges: reading
//! files, parsing sync exports, loading configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all DishCore operations
#[derive(Debug, Error)]
pub enum DishCoreError {
    /// Reading import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reading import specific errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// File extension does not map to a supported format
    #[error("Unsupported format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// File contained no readings at all
    #[error("No readings found in {path}")]
    Empty { path: PathBuf },
}

/// Result type alias for DishCore operations
pub type Result<T> = std::result::Result<T, DishCoreError>;

impl DishCoreError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DishCoreError::Import(ImportError::Empty { .. }) => ErrorSeverity::Warning,
            DishCoreError::Validation(_) => ErrorSeverity::Warning,
            DishCoreError::Import(_) => ErrorSeverity::Error,
            DishCoreError::Configuration(_) => ErrorSeverity::Error,
            DishCoreError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            DishCoreError::Import(ImportError::UnsupportedFormat { path }) => {
                format!(
                    "Don't know how to read {}. Supported formats are .json and .csv",
                    path.display()
                )
            }
            DishCoreError::Import(ImportError::Empty { path }) => {
                format!("{} contains no device readings", path.display())
            }
            DishCoreError::Configuration(reason) => {
                format!("Configuration problem: {}", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
