//! # Storage Strategy Factory
//!
//! Registry of storage backends with their static priority configuration and
//! a cache of the latest health probe for each. Selection and fallback read
//! only the cache; live probing belongs to the [health monitor](super::health_monitor).

use super::health_monitor::{run_health_round, HealthMonitor};
use super::strategy::{
    HealthRecord, HealthStatus, StorageError, StorageResult, StorageStrategy, StrategyConfig,
    StrategyType,
};
use crate::config::StorageFactoryConfig;
use crate::constants::factory::PRIMARY_PRIORITY;
use crate::events::{EventPublisher, StrategyHealthChange};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Aggregate snapshot of the factory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryStatus {
    pub total_strategies: usize,
    pub enabled_strategies: usize,
    pub healthy_strategies: usize,
    pub degraded_strategies: usize,
    pub unhealthy_strategies: usize,
    pub primary_strategy_name: Option<String>,
    pub health_check_interval_ms: u64,
}

/// A registered backend together with its configuration
#[derive(Clone)]
pub struct StrategyHandle {
    config: StrategyConfig,
    strategy: Arc<dyn StorageStrategy>,
}

impl StrategyHandle {
    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn strategy(&self) -> Arc<dyn StorageStrategy> {
        Arc::clone(&self.strategy)
    }
}

impl fmt::Debug for StrategyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyHandle")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Shared state between the factory and its health monitor task
#[derive(Debug, Default)]
pub(crate) struct StrategyRegistry {
    strategies: RwLock<Vec<StrategyHandle>>,
    health_cache: DashMap<String, HealthRecord>,
}

impl StrategyRegistry {
    pub(crate) fn snapshot(&self) -> Vec<StrategyHandle> {
        self.strategies.read().clone()
    }

    fn register(&self, handle: StrategyHandle) -> StorageResult<()> {
        let mut strategies = self.strategies.write();
        if strategies.iter().any(|s| s.id() == handle.id()) {
            return Err(StorageError::DuplicateStrategy(handle.config.id));
        }
        strategies.push(handle);
        Ok(())
    }

    fn clear(&self) {
        self.strategies.write().clear();
        self.health_cache.clear();
    }

    fn is_cached_healthy(&self, id: &str) -> bool {
        self.health_cache
            .get(id)
            .map(|record| record.status == HealthStatus::Healthy)
            .unwrap_or(false)
    }

    /// Store a probe result; returns the change when the status moved.
    /// Results for strategies removed mid-round are dropped.
    pub(crate) fn record_health(&self, id: &str, record: HealthRecord) -> Option<StrategyHealthChange> {
        if !self.strategies.read().iter().any(|s| s.id() == id) {
            debug!(strategy_id = %id, "Dropping health result for unregistered strategy");
            return None;
        }

        let new_status = record.status;
        let error = record.error.clone();
        let previous_status = self
            .health_cache
            .insert(id.to_string(), record)
            .map(|previous| previous.status);

        if previous_status == Some(new_status) {
            return None;
        }

        Some(StrategyHealthChange {
            strategy_id: id.to_string(),
            previous_status,
            new_status,
            error,
            observed_at: Utc::now(),
        })
    }

    pub(crate) fn primary(&self) -> Option<StrategyHandle> {
        let strategies = self.strategies.read();
        let enabled = || strategies.iter().filter(|s| s.config.enabled);

        enabled()
            .find(|s| s.config.priority == PRIMARY_PRIORITY)
            .or_else(|| enabled().min_by_key(|s| s.config.priority))
            .cloned()
    }

    pub(crate) fn status(&self, health_check_interval_ms: u64) -> FactoryStatus {
        let strategies = self.strategies.read();
        let count_status = |status: HealthStatus| {
            strategies
                .iter()
                .filter(|s| {
                    self.health_cache
                        .get(s.id())
                        .map(|record| record.status == status)
                        .unwrap_or(false)
                })
                .count()
        };

        FactoryStatus {
            total_strategies: strategies.len(),
            enabled_strategies: strategies.iter().filter(|s| s.config.enabled).count(),
            healthy_strategies: count_status(HealthStatus::Healthy),
            degraded_strategies: count_status(HealthStatus::Degraded),
            unhealthy_strategies: count_status(HealthStatus::Unhealthy),
            primary_strategy_name: None,
            health_check_interval_ms,
        }
    }
}

/// Registry of storage backends with health-aware selection and fallback
#[derive(Debug)]
pub struct StrategyFactory {
    config: StorageFactoryConfig,
    registry: Arc<StrategyRegistry>,
    publisher: Option<EventPublisher>,
    monitor: Mutex<Option<HealthMonitor>>,
}

impl StrategyFactory {
    /// Out-of-range config fields are replaced with their defaults
    pub fn new(config: StorageFactoryConfig) -> Self {
        let (config, _rejected) = config.sanitized();
        Self {
            config,
            registry: Arc::new(StrategyRegistry::default()),
            publisher: None,
            monitor: Mutex::new(None),
        }
    }

    /// Publish health changes and status snapshots on `publisher`
    pub fn with_publisher(mut self, publisher: EventPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn config(&self) -> &StorageFactoryConfig {
        &self.config
    }

    /// Add a backend. Meant for startup; ids must be unique.
    pub fn register_strategy(
        &self,
        strategy: Arc<dyn StorageStrategy>,
        config: StrategyConfig,
    ) -> StorageResult<()> {
        let id = config.id.clone();
        let strategy_type = config.strategy_type;
        let priority = config.priority;
        let enabled = config.enabled;

        self.registry.register(StrategyHandle { config, strategy })?;

        info!(
            strategy_id = %id,
            strategy_type = %strategy_type,
            priority,
            enabled,
            "Registered storage strategy"
        );
        Ok(())
    }

    /// Look up a strategy by id, enabled or not
    pub fn strategy(&self, id: &str) -> Option<StrategyHandle> {
        self.registry
            .strategies
            .read()
            .iter()
            .find(|s| s.id() == id)
            .cloned()
    }

    /// Configurations in registration order
    pub fn strategy_configs(&self) -> Vec<StrategyConfig> {
        self.registry
            .strategies
            .read()
            .iter()
            .map(|s| s.config.clone())
            .collect()
    }

    /// The enabled strategy with priority 1, else the lowest-priority
    /// enabled strategy
    pub fn get_primary_strategy(&self) -> Option<StrategyHandle> {
        self.registry.primary()
    }

    /// Lowest-priority enabled strategy that is cached healthy. When none is
    /// healthy, the lowest-priority enabled strategy is returned anyway so
    /// callers get degraded service rather than none.
    pub fn select_best_strategy(&self, preferred_type: Option<StrategyType>) -> Option<StrategyHandle> {
        let strategies = self.registry.strategies.read();
        let candidates: Vec<&StrategyHandle> = strategies
            .iter()
            .filter(|s| s.config.enabled)
            .filter(|s| preferred_type.map_or(true, |t| s.config.strategy_type == t))
            .collect();

        if let Some(best) = candidates
            .iter()
            .filter(|s| self.registry.is_cached_healthy(s.id()))
            .min_by_key(|s| s.config.priority)
        {
            return Some((*best).clone());
        }

        let fallback = candidates.iter().min_by_key(|s| s.config.priority)?;
        warn!(
            strategy_id = %fallback.id(),
            preferred_type = ?preferred_type,
            candidates = candidates.len(),
            "No healthy storage strategy, degrading to lowest priority enabled strategy"
        );
        Some((*fallback).clone())
    }

    /// Next strategy to try after `failed_id` failed: the lowest priority
    /// among enabled, fallback-allowed strategies ranked strictly after it.
    pub fn get_fallback_strategy(&self, failed_id: &str) -> Option<StrategyHandle> {
        let strategies = self.registry.strategies.read();
        let failed = strategies.iter().find(|s| s.id() == failed_id)?;

        if !failed.config.allow_fallback {
            debug!(strategy_id = %failed_id, "Fallback disabled for strategy");
            return None;
        }

        let fallback = strategies
            .iter()
            .filter(|s| s.config.enabled && s.config.allow_fallback)
            .filter(|s| s.config.priority > failed.config.priority)
            .min_by_key(|s| s.config.priority)
            .cloned();

        match &fallback {
            Some(next) => info!(
                failed_strategy = %failed_id,
                fallback_strategy = %next.id(),
                "Selected fallback storage strategy"
            ),
            None => warn!(failed_strategy = %failed_id, "No fallback storage strategy available"),
        }
        fallback
    }

    /// Cached health for one strategy; never probes
    pub fn get_strategy_health(&self, id: &str) -> Option<HealthRecord> {
        self.registry.health_cache.get(id).map(|r| r.value().clone())
    }

    /// Cached health for every probed strategy
    pub fn get_all_strategy_health(&self) -> Vec<(String, HealthRecord)> {
        let mut all: Vec<_> = self
            .registry
            .health_cache
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub fn get_status(&self) -> FactoryStatus {
        FactoryStatus {
            primary_strategy_name: self.get_primary_strategy().map(|s| s.config.name),
            ..self
                .registry
                .status(self.config.health_check_interval_ms())
        }
    }

    /// Start the background health poller. Returns false if it is already
    /// running. Must be called from within a tokio runtime.
    pub fn start_health_monitoring(&self) -> bool {
        let mut monitor = self.monitor.lock();
        if monitor.as_ref().is_some_and(HealthMonitor::is_running) {
            debug!("Health monitoring already running");
            return false;
        }

        *monitor = Some(HealthMonitor::spawn(
            Arc::clone(&self.registry),
            self.config.clone(),
            self.publisher.clone(),
        ));
        true
    }

    /// Stop the poller. Safe to call any number of times.
    pub fn stop_health_monitoring(&self) {
        if let Some(monitor) = self.monitor.lock().take() {
            monitor.stop();
        }
    }

    /// True while the poller task is alive
    pub fn is_monitoring(&self) -> bool {
        self.monitor
            .lock()
            .as_ref()
            .is_some_and(HealthMonitor::is_running)
    }

    /// Probe every strategy once and wait for all probes to settle
    pub async fn check_health_now(&self) -> FactoryStatus {
        run_health_round(&self.registry, &self.config, self.publisher.as_ref()).await;
        self.get_status()
    }

    /// Stop monitoring and release every registered strategy and cached
    /// health record
    pub fn dispose(&self) {
        self.stop_health_monitoring();
        self.registry.clear();
        info!("Storage strategy factory disposed");
    }
}

impl Default for StrategyFactory {
    fn default() -> Self {
        Self::new(StorageFactoryConfig::default())
    }
}

impl Drop for StrategyFactory {
    fn drop(&mut self) {
        self.stop_health_monitoring();
    }
}
