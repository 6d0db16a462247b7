//! Configuration Error Types
//!
//! Errors raised while loading and validating breaker and factory settings.
//! Field-level errors are normally downgraded to warnings by the loader, which
//! substitutes the default value; only file-level errors stop a load.

use thiserror::Error;

/// Configuration-related errors with detailed context
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Value could not be parsed into the field's type
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },

    /// Value parsed but lies outside the accepted range
    #[error("Value '{value}' for field '{field}' is outside the accepted range [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: String,
        min: u64,
        max: u64,
    },

    /// File I/O errors during configuration loading
    #[error("Failed to read configuration file '{file_path}': {error}")]
    FileReadError { file_path: String, error: String },

    /// Configuration source could not be parsed or merged
    #[error("Parse error for configuration source '{source_name}': {reason}")]
    ParseError { source_name: String, reason: String },
}

impl ConfigurationError {
    /// Create an invalid value error
    pub fn invalid_value<F: Into<String>, V: Into<String>, C: Into<String>>(
        field: F,
        value: V,
        context: C,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            context: context.into(),
        }
    }

    /// Create an out of range error
    pub fn out_of_range<F: Into<String>, V: ToString>(field: F, value: V, min: u64, max: u64) -> Self {
        Self::OutOfRange {
            field: field.into(),
            value: value.to_string(),
            min,
            max,
        }
    }

    /// Create a file read error
    pub fn file_read_error<P: Into<String>, E: std::fmt::Display>(file_path: P, error: E) -> Self {
        Self::FileReadError {
            file_path: file_path.into(),
            error: error.to_string(),
        }
    }

    /// Create a parse error
    pub fn parse_error<S: Into<String>, E: std::fmt::Display>(source_name: S, reason: E) -> Self {
        Self::ParseError {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Name of the offending field, for field-level errors
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { field, .. } | Self::OutOfRange { field, .. } => Some(field),
            Self::FileReadError { .. } | Self::ParseError { .. } => None,
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigurationError>;
