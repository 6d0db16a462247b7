//! # Resilient Storage
//!
//! Facade that runs each storage operation against the best available
//! strategy through that strategy's circuit breaker, then walks the fallback
//! chain when the failure is one another backend could avoid.

use super::factory::{StrategyFactory, StrategyHandle};
use super::strategy::{
    FileRef, StorageError, StorageResult, StorageStrategy, StrategyConfig, StrategyType, UploadRequest,
};
use crate::config::ConfigLoader;
use crate::logging::log_strategy_operation;
use crate::resilience::CircuitBreakerManager;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::warn;

/// Storage operations with breaker protection and automatic failover
#[derive(Debug, Clone)]
pub struct ResilientStorage {
    factory: Arc<StrategyFactory>,
    breakers: CircuitBreakerManager,
    preferred_type: Option<StrategyType>,
}

impl ResilientStorage {
    /// Breakers are looked up in `breakers` by strategy id
    pub fn new(factory: Arc<StrategyFactory>, breakers: CircuitBreakerManager) -> Self {
        Self {
            factory,
            breakers,
            preferred_type: None,
        }
    }

    /// Load configuration, register `strategies` in a new factory and guard
    /// them with breakers built from the loaded breaker settings
    pub fn from_loader<I>(loader: &ConfigLoader, strategies: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (Arc<dyn StorageStrategy>, StrategyConfig)>,
    {
        let loaded = loader.load()?;
        let factory = Arc::new(StrategyFactory::new(loaded.factory));
        for (strategy, config) in strategies {
            factory.register_strategy(strategy, config)?;
        }
        Ok(Self::new(factory, CircuitBreakerManager::new(loaded.breaker)))
    }

    /// Restrict the initial selection to one backend type. Fallbacks may
    /// still be of any type.
    pub fn with_preferred_type(mut self, strategy_type: StrategyType) -> Self {
        self.preferred_type = Some(strategy_type);
        self
    }

    pub fn factory(&self) -> &Arc<StrategyFactory> {
        &self.factory
    }

    pub fn breakers(&self) -> &CircuitBreakerManager {
        &self.breakers
    }

    pub async fn upload(&self, request: UploadRequest) -> StorageResult<FileRef> {
        self.run("upload", |strategy| {
            let request = request.clone();
            async move { strategy.upload(request).await }
        })
        .await
    }

    pub async fn download(&self, file: &FileRef) -> StorageResult<Vec<u8>> {
        self.run("download", |strategy| async move { strategy.download(file).await })
            .await
    }

    pub async fn delete(&self, file: &FileRef) -> StorageResult<()> {
        self.run("delete", |strategy| async move { strategy.delete(file).await })
            .await
    }

    pub async fn exists(&self, file: &FileRef) -> StorageResult<bool> {
        self.run("exists", |strategy| async move { strategy.exists(file).await })
            .await
    }

    pub async fn list(&self, prefix: Option<&str>) -> StorageResult<Vec<FileRef>> {
        self.run("list", |strategy| async move { strategy.list(prefix).await })
            .await
    }

    pub async fn copy_file(&self, source: &FileRef, destination: &str) -> StorageResult<()> {
        self.run("copy_file", |strategy| async move {
            strategy.copy_file(source, destination).await
        })
        .await
    }

    pub async fn move_file(&self, source: &FileRef, destination: &str) -> StorageResult<()> {
        self.run("move_file", |strategy| async move {
            strategy.move_file(source, destination).await
        })
        .await
    }

    pub async fn create_directory(&self, path: &str) -> StorageResult<()> {
        self.run("create_directory", |strategy| async move {
            strategy.create_directory(path).await
        })
        .await
    }

    async fn run<T, F, Fut>(&self, operation: &'static str, op: F) -> StorageResult<T>
    where
        F: Fn(Arc<dyn StorageStrategy>) -> Fut,
        Fut: Future<Output = StorageResult<T>>,
    {
        let mut current: StrategyHandle = self
            .factory
            .select_best_strategy(self.preferred_type)
            .ok_or(StorageError::NoStrategyAvailable)?;

        loop {
            let breaker = self.breakers.get_circuit_breaker(current.id()).await;
            let started = Instant::now();
            // Caller errors (missing file, bad input) say nothing about the
            // backend, so they reach the breaker as a completed call
            let result = breaker
                .execute_with_result(|| async {
                    match op(current.strategy()).await {
                        Err(error) if error.is_retryable() => Err(error),
                        outcome => Ok(outcome),
                    }
                })
                .await;
            let duration_ms = started.elapsed().as_millis() as u64;

            let error = match result {
                Ok(Ok(value)) => {
                    log_strategy_operation(operation, current.id(), "success", Some(duration_ms), None);
                    return Ok(value);
                }
                Ok(Err(error)) => {
                    let details = error.to_string();
                    log_strategy_operation(operation, current.id(), "caller_error", Some(duration_ms), Some(&details));
                    return Err(error);
                }
                Err(error) => error,
            };

            let details = error.to_string();
            log_strategy_operation(operation, current.id(), "failure", Some(duration_ms), Some(&details));

            match self.factory.get_fallback_strategy(current.id()) {
                Some(next) => {
                    warn!(
                        operation,
                        failed_strategy = %current.id(),
                        fallback_strategy = %next.id(),
                        error = %error,
                        "Retrying storage operation on fallback strategy"
                    );
                    current = next;
                }
                None => return Err(error),
            }
        }
    }
}
