//! Event payloads.

use crate::resilience::StateTransitionEvent;
use crate::storage::{FactoryStatus, HealthStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health status change observed by the poller for one strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyHealthChange {
    pub strategy_id: String,
    /// `None` on the first poll of a strategy
    pub previous_status: Option<HealthStatus>,
    pub new_status: HealthStatus,
    pub error: Option<String>,
    pub observed_at: DateTime<Utc>,
}

/// Everything the resilience layer reports to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResilienceEvent {
    StateTransition(StateTransitionEvent),
    StrategyHealthChanged(StrategyHealthChange),
    FactoryStatus(FactoryStatus),
}

impl ResilienceEvent {
    /// Stable event name for routing in sinks
    pub fn name(&self) -> &'static str {
        match self {
            ResilienceEvent::StateTransition(_) => "circuit_breaker.state_transition",
            ResilienceEvent::StrategyHealthChanged(_) => "storage.strategy_health_changed",
            ResilienceEvent::FactoryStatus(_) => "storage.factory_status",
        }
    }
}
