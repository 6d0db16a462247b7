#![allow(clippy::doc_markdown)] // Allow technical terms like HalfOpen, S3 in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Storage Resilience
//!
//! Circuit breakers and a health-aware strategy factory for applications that
//! store files on several interchangeable backends.
//!
//! ## Overview
//!
//! The crate decides *whether* a storage operation is attempted and *which*
//! backend it is attempted against. It does not implement the backends and it
//! does not bound the latency of the operations it wraps.
//!
//! ## Module Organization
//!
//! - [`config`] - Breaker and factory configuration with validate-or-default loading
//! - [`resilience`] - Circuit breaker state machine, manager and metrics
//! - [`storage`] - Strategy trait, factory, health polling and the resilient facade
//! - [`events`] - Broadcast channel for transitions, health changes and status snapshots
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use storage_resilience::config::ConfigLoader;
//! use storage_resilience::storage::{
//!     ResilientStorage, StorageStrategy, StrategyConfig, StrategyType, UploadRequest,
//! };
//! use storage_resilience::test_helpers::InMemoryStrategy;
//!
//! # async fn example() -> storage_resilience::Result<()> {
//! storage_resilience::logging::init_structured_logging();
//!
//! let primary: Arc<dyn StorageStrategy> = Arc::new(InMemoryStrategy::new("primary"));
//! let storage = ResilientStorage::from_loader(
//!     &ConfigLoader::new(),
//!     [(primary, StrategyConfig::new("primary", "Primary", StrategyType::Memory, 1))],
//! )?;
//! storage.factory().start_health_monitoring();
//!
//! let file = storage.upload(UploadRequest::new("reports/q1.csv", b"a,b".to_vec())).await?;
//! # let _ = file;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod resilience;
pub mod storage;
pub mod test_helpers;

pub use config::{CircuitBreakerConfig, ConfigLoader, LoadedConfig, StorageFactoryConfig};
pub use error::{ResilienceError, Result};
pub use events::{EventPublisher, ResilienceEvent};
pub use resilience::{
    AdmissionError, CircuitBreaker, CircuitBreakerError, CircuitBreakerManager, CircuitState,
};
pub use storage::{
    ResilientStorage, StorageError, StorageStrategy, StrategyConfig, StrategyFactory, StrategyType,
};
