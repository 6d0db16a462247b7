//! # Circuit Breaker Manager
//!
//! Keeps exactly one live breaker per dependency name, so every caller
//! touching the same storage backend shares its state. Provides bulk operator
//! overrides and system-wide metrics aggregation.

use crate::config::CircuitBreakerConfig;
use crate::events::EventPublisher;
use crate::resilience::{
    CircuitBreaker, CircuitBreakerMetrics, CircuitState, SystemCircuitBreakerMetrics,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Manager for the circuit breakers of every storage dependency
#[derive(Debug, Clone)]
pub struct CircuitBreakerManager {
    /// Collection of circuit breakers by dependency name
    circuit_breakers: Arc<RwLock<HashMap<String, Arc<CircuitBreaker>>>>,

    /// Used for any name without an override; the name is substituted
    default_config: CircuitBreakerConfig,

    component_configs: Arc<parking_lot::RwLock<HashMap<String, CircuitBreakerConfig>>>,

    publisher: Option<EventPublisher>,
}

impl CircuitBreakerManager {
    pub fn new(default_config: CircuitBreakerConfig) -> Self {
        info!(
            failure_threshold = default_config.failure_threshold,
            timeout_ms = default_config.timeout_ms(),
            "Initializing circuit breaker manager"
        );

        Self {
            circuit_breakers: Arc::new(RwLock::new(HashMap::new())),
            default_config,
            component_configs: Arc::new(parking_lot::RwLock::new(HashMap::new())),
            publisher: None,
        }
    }

    /// Breakers created from now on publish their transitions here
    pub fn with_publisher(mut self, publisher: EventPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Register a per-dependency override before the breaker is first used
    pub fn with_component_config(self, name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        self.component_configs.write().insert(name.into(), config);
        self
    }

    /// Effective configuration for a dependency
    pub fn config_for_component(&self, name: &str) -> CircuitBreakerConfig {
        let config = self
            .component_configs
            .read()
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.default_config.clone());

        CircuitBreakerConfig {
            name: name.to_string(),
            ..config
        }
    }

    /// Get or create the breaker for a dependency
    pub async fn get_circuit_breaker(&self, name: &str) -> Arc<CircuitBreaker> {
        {
            let breakers = self.circuit_breakers.read().await;
            if let Some(breaker) = breakers.get(name) {
                return Arc::clone(breaker);
            }
        }

        let mut breakers = self.circuit_breakers.write().await;

        // Double-check pattern (another task might have created it)
        if let Some(breaker) = breakers.get(name) {
            return Arc::clone(breaker);
        }

        let mut breaker = CircuitBreaker::new(self.config_for_component(name));
        if let Some(publisher) = &self.publisher {
            breaker = breaker.with_publisher(publisher.clone());
        }
        let breaker = Arc::new(breaker);

        breakers.insert(name.to_string(), Arc::clone(&breaker));

        info!(
            component = name,
            total_circuit_breakers = breakers.len(),
            "Created new circuit breaker"
        );

        breaker
    }

    /// Replace a dependency's configuration. A live breaker is reloaded in
    /// place so its state and history survive.
    pub async fn update_component_config(&self, name: &str, config: CircuitBreakerConfig) {
        self.component_configs
            .write()
            .insert(name.to_string(), config);

        let breakers = self.circuit_breakers.read().await;
        if let Some(breaker) = breakers.get(name) {
            breaker.reload_config(self.config_for_component(name));
        }

        info!(component = name, "⚙️ Updated circuit breaker configuration");
    }

    /// Get all circuit breaker names
    pub async fn list_components(&self) -> Vec<String> {
        let breakers = self.circuit_breakers.read().await;
        let mut names: Vec<String> = breakers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get metrics for a specific circuit breaker
    pub async fn get_component_metrics(&self, name: &str) -> Option<CircuitBreakerMetrics> {
        let breakers = self.circuit_breakers.read().await;
        breakers.get(name).map(|breaker| breaker.metrics())
    }

    /// Get system-wide circuit breaker metrics
    pub async fn get_system_metrics(&self) -> SystemCircuitBreakerMetrics {
        let mut system_metrics = SystemCircuitBreakerMetrics::new();

        let breakers = self.circuit_breakers.read().await;
        for (name, breaker) in breakers.iter() {
            system_metrics.add_circuit_breaker(name.clone(), breaker.metrics());
        }

        system_metrics
    }

    /// Get count of circuit breakers by state
    pub async fn get_state_summary(&self) -> HashMap<CircuitState, usize> {
        self.get_system_metrics().await.count_by_state()
    }

    /// Check overall system health based on circuit breaker states
    pub async fn system_health_score(&self) -> f64 {
        self.get_system_metrics().await.health_score()
    }

    /// Force open all circuit breakers (emergency stop)
    pub async fn force_open_all(&self, reason: &str) {
        warn!(reason = %reason, "🚨 Forcing all circuit breakers open (emergency stop)");

        let breakers = self.circuit_breakers.read().await;
        for breaker in breakers.values() {
            breaker.force_open(reason);
        }
    }

    /// Force close all circuit breakers (emergency recovery)
    pub async fn force_close_all(&self, reason: &str) {
        warn!(reason = %reason, "🚨 Forcing all circuit breakers closed (emergency recovery)");

        let breakers = self.circuit_breakers.read().await;
        for breaker in breakers.values() {
            breaker.force_close(reason);
        }
    }

    /// Close every breaker and clear its counters
    pub async fn reset_all(&self, reason: &str) {
        let breakers = self.circuit_breakers.read().await;
        for breaker in breakers.values() {
            breaker.reset(reason);
        }
        info!(reason = %reason, count = breakers.len(), "Reset all circuit breakers");
    }

    /// Remove circuit breaker for a dependency
    pub async fn remove_circuit_breaker(&self, name: &str) -> bool {
        let mut breakers = self.circuit_breakers.write().await;
        if breakers.remove(name).is_some() {
            info!(
                component = name,
                remaining_count = breakers.len(),
                "🗑️ Removed circuit breaker"
            );
            true
        } else {
            false
        }
    }
}

impl Default for CircuitBreakerManager {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
