//! # Storage Strategy Contract
//!
//! The uniform capability surface every storage backend exposes, plus the
//! static configuration and health records the factory keeps for each one.

use crate::resilience::AdmissionError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Kind of backend behind a strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyType {
    Local,
    S3,
    Azure,
    Gcs,
    Memory,
}

impl StrategyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::Local => "local",
            StrategyType::S3 => "s3",
            StrategyType::Azure => "azure",
            StrategyType::Gcs => "gcs",
            StrategyType::Memory => "memory",
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static configuration for one registered backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub id: String,
    pub name: String,
    pub strategy_type: StrategyType,
    /// Lower is preferred
    pub priority: u32,
    pub enabled: bool,
    /// Whether a failure here may be retried against another backend
    pub allow_fallback: bool,
}

impl StrategyConfig {
    /// Enabled strategy that allows fallback
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        strategy_type: StrategyType,
        priority: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            strategy_type,
            priority,
            enabled: true,
            allow_fallback: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn without_fallback(mut self) -> Self {
        self.allow_fallback = false;
        self
    }
}

/// Coarse health classification reported by probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        };
        f.write_str(s)
    }
}

/// Result of one health probe against a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub status: HealthStatus,
    pub response_time_ms: u64,
    /// Fraction of recent operations that succeeded (0.0 to 1.0)
    pub success_rate: f64,
    pub available_capacity: u64,
    pub total_capacity: u64,
    pub last_checked: DateTime<Utc>,
    pub error: Option<String>,
}

impl HealthRecord {
    pub fn healthy(response_time_ms: u64) -> Self {
        Self::with_status(HealthStatus::Healthy, response_time_ms)
    }

    pub fn with_status(status: HealthStatus, response_time_ms: u64) -> Self {
        Self {
            status,
            response_time_ms,
            success_rate: if status == HealthStatus::Unhealthy { 0.0 } else { 1.0 },
            available_capacity: 0,
            total_capacity: 0,
            last_checked: Utc::now(),
            error: None,
        }
    }

    /// Record for a probe that errored, timed out or panicked
    pub fn unhealthy(error: impl Into<String>, response_time_ms: u64) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::with_status(HealthStatus::Unhealthy, response_time_ms)
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Reference to a stored object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef {
    pub path: String,
    pub size: u64,
    pub content_type: Option<String>,
    /// Strategy that holds the object
    pub strategy_id: String,
}

/// Payload for [`StorageStrategy::upload`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub path: String,
    pub content: Vec<u8>,
    pub content_type: Option<String>,
}

impl UploadRequest {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Errors from storage backends and the strategy factory
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("Storage backend '{strategy_id}' failed: {message}")]
    Backend { strategy_id: String, message: String },

    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage operation '{operation}' timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    #[error("Health probe for '{strategy_id}' failed: {message}")]
    HealthProbe { strategy_id: String, message: String },

    #[error("Storage strategy '{0}' is already registered")]
    DuplicateStrategy(String),

    #[error("No storage strategy available")]
    NoStrategyAvailable,

    /// The backend's circuit breaker refused the call
    #[error(transparent)]
    Unavailable(#[from] AdmissionError),
}

impl StorageError {
    pub fn backend(strategy_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            strategy_id: strategy_id.into(),
            message: message.into(),
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Whether another backend might succeed where this one failed.
    /// Caller mistakes and missing objects are not retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::Backend { .. }
                | StorageError::Timeout { .. }
                | StorageError::HealthProbe { .. }
                | StorageError::Unavailable(_)
        )
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Capability surface of a storage backend
#[async_trait]
pub trait StorageStrategy: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> StorageResult<FileRef>;

    async fn download(&self, file: &FileRef) -> StorageResult<Vec<u8>>;

    async fn delete(&self, file: &FileRef) -> StorageResult<()>;

    async fn exists(&self, file: &FileRef) -> StorageResult<bool>;

    async fn list(&self, prefix: Option<&str>) -> StorageResult<Vec<FileRef>>;

    async fn copy_file(&self, source: &FileRef, destination: &str) -> StorageResult<()>;

    async fn move_file(&self, source: &FileRef, destination: &str) -> StorageResult<()>;

    async fn create_directory(&self, path: &str) -> StorageResult<()>;

    /// Live health probe; the factory bounds it with a timeout
    async fn get_health(&self) -> StorageResult<HealthRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(StorageError::backend("s3", "503").is_retryable());
        assert!(StorageError::Timeout {
            operation: "upload".to_string(),
            timeout: Duration::from_secs(1),
        }
        .is_retryable());
        assert!(StorageError::from(AdmissionError::HalfOpenLimit {
            name: "s3".to_string(),
            max_calls: 3,
        })
        .is_retryable());

        assert!(!StorageError::not_found("a.txt").is_retryable());
        assert!(!StorageError::InvalidInput("empty path".to_string()).is_retryable());
        assert!(!StorageError::NoStrategyAvailable.is_retryable());
    }

    #[test]
    fn test_unhealthy_record_carries_error() {
        let record = HealthRecord::unhealthy("connection refused", 12);
        assert_eq!(record.status, HealthStatus::Unhealthy);
        assert_eq!(record.error.as_deref(), Some("connection refused"));
        assert_eq!(record.success_rate, 0.0);
        assert!(!record.is_healthy());
    }

    #[test]
    fn test_strategy_config_builders() {
        let config = StrategyConfig::new("s3", "Primary S3", StrategyType::S3, 1)
            .without_fallback()
            .disabled();
        assert!(!config.enabled);
        assert!(!config.allow_fallback);
        assert_eq!(
            serde_json::to_value(config.strategy_type).unwrap(),
            serde_json::json!("s3")
        );
    }
}
