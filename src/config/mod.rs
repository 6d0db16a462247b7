//! # Configuration
//!
//! Typed, validated settings for circuit breakers and the storage strategy
//! factory.
//!
//! ## Data Flow
//!
//! ```text
//! optional config file + STORAGE_RESILIENCE_* environment
//!     → loader.rs (merge via the `config` crate, env wins)
//!     → validation.rs (per-field parse + range check)
//!     → CircuitBreakerConfig / StorageFactoryConfig (immutable)
//!     → injected into breakers and the factory
//! ```
//!
//! Invalid values never abort startup: each rejected field falls back to its
//! default and is reported as a warning in [`LoadedConfig`].

pub mod circuit_breaker;
pub mod error;
pub mod factory;
pub mod loader;
pub mod validation;

pub use circuit_breaker::CircuitBreakerConfig;
pub use error::{ConfigResult, ConfigurationError};
pub use factory::StorageFactoryConfig;
pub use loader::{ConfigLoader, LoadedConfig};
