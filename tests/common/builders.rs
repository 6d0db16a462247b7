//! Test fixture builders for factories populated with in-memory strategies.

use std::sync::Arc;
use std::time::Duration;
use storage_resilience::config::{CircuitBreakerConfig, StorageFactoryConfig};
use storage_resilience::storage::{StrategyConfig, StrategyFactory, StrategyType};
use storage_resilience::test_helpers::InMemoryStrategy;

/// Builder for a factory and the in-memory strategies registered in it
pub struct FactoryBuilder {
    config: StorageFactoryConfig,
    entries: Vec<StrategyConfig>,
}

impl FactoryBuilder {
    pub fn new() -> Self {
        Self {
            config: StorageFactoryConfig::default(),
            entries: Vec::new(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.config.health_check_interval = interval;
        self
    }

    pub fn with_strategy(mut self, id: &str, strategy_type: StrategyType, priority: u32) -> Self {
        self.entries
            .push(StrategyConfig::new(id, id.to_uppercase(), strategy_type, priority));
        self
    }

    pub fn with_config(mut self, config: StrategyConfig) -> Self {
        self.entries.push(config);
        self
    }

    /// Factory plus handles to each strategy, in registration order
    pub fn build(self) -> (Arc<StrategyFactory>, Vec<Arc<InMemoryStrategy>>) {
        let factory = Arc::new(StrategyFactory::new(self.config));
        let strategies = self
            .entries
            .into_iter()
            .map(|config| {
                let strategy = Arc::new(InMemoryStrategy::new(&config.id));
                factory
                    .register_strategy(strategy.clone(), config)
                    .expect("Failed to register test strategy");
                strategy
            })
            .collect();
        (factory, strategies)
    }
}

impl Default for FactoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Breaker config with small thresholds for fast tests
pub fn fast_breaker_config(name: &str) -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        failure_threshold: 2,
        timeout: Duration::from_millis(1_000),
        half_open_max_calls: 2,
        success_threshold: 2,
        max_history_size: 10,
        ..CircuitBreakerConfig::named(name)
    }
}
