//! # Error Types
//!
//! Crate-level error taxonomy. Admission-control rejections, backend failures
//! and configuration problems each have their own enum; `ResilienceError`
//! unifies them for callers that only want one error type.

use crate::config::ConfigurationError;
use crate::resilience::AdmissionError;
use crate::storage::StorageError;
use thiserror::Error;

/// Top-level error for the storage resilience layer
#[derive(Debug, Error)]
pub enum ResilienceError {
    /// A circuit breaker refused to admit the call
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    /// A storage backend operation failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration could not be loaded
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl ResilienceError {
    /// True when the error came from breaker admission control rather than
    /// the wrapped operation
    pub fn is_admission_rejection(&self) -> bool {
        matches!(
            self,
            ResilienceError::Admission(_) | ResilienceError::Storage(StorageError::Unavailable(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, ResilienceError>;
