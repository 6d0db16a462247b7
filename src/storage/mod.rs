//! # Storage Module
//!
//! Interchangeable storage backends behind one capability trait, a factory
//! that selects between them by priority and cached health, a background
//! health poller, and a facade that ties selection to circuit breakers and
//! fallback.

pub mod factory;
mod health_monitor;
pub mod resilient;
pub mod strategy;

pub use factory::{FactoryStatus, StrategyFactory, StrategyHandle};
pub use resilient::ResilientStorage;
pub use strategy::{
    FileRef, HealthRecord, HealthStatus, StorageError, StorageResult, StorageStrategy,
    StrategyConfig, StrategyType, UploadRequest,
};
