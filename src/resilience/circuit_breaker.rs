//! # Circuit Breaker Implementation
//!
//! Fault isolation for storage dependencies. A breaker admits calls while
//! closed, fails fast while open, and lets a bounded number of trial calls
//! through while half-open to test whether the dependency has recovered.
//!
//! All state lives behind a single `parking_lot::Mutex`. Admission, success
//! and failure bookkeeping each take the lock once and never across an
//! `.await`, so concurrent callers sharing one breaker see serialized updates.

use crate::config::{CircuitBreakerConfig, ConfigurationError};
use crate::constants::reasons;
use crate::events::{EventPublisher, ResilienceEvent};
use crate::logging::log_breaker_transition;
use crate::resilience::{
    CircuitBreakerMetrics, CircuitState, StateManager, StateTransition, StateTransitionEvent,
};
use parking_lot::{Mutex, RwLock};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Admission-control rejection. The wrapped operation was never invoked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    /// Dependency presumed down; calls fail fast until the timeout elapses
    #[error("Circuit breaker '{name}' is open, retry after {retry_after:?}")]
    CircuitOpen { name: String, retry_after: Duration },

    /// Every half-open trial slot is taken
    #[error("Circuit breaker '{name}' is half-open and already admitted {max_calls} trial calls")]
    HalfOpenLimit { name: String, max_calls: u32 },
}

impl AdmissionError {
    pub fn breaker_name(&self) -> &str {
        match self {
            AdmissionError::CircuitOpen { name, .. } | AdmissionError::HalfOpenLimit { name, .. } => {
                name
            }
        }
    }
}

/// Errors surfaced by [`CircuitBreaker::execute`]: either the breaker's own
/// rejection or the operation's error, unmodified.
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error(transparent)]
    Rejected(#[from] AdmissionError),

    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

impl<E> CircuitBreakerError<E> {
    pub fn is_rejection(&self) -> bool {
        matches!(self, CircuitBreakerError::Rejected(_))
    }

    /// The operation's own error, if the operation ran
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            CircuitBreakerError::OperationFailed(e) => Some(e),
            CircuitBreakerError::Rejected(_) => None,
        }
    }
}

/// Circuit breaker guarding one named dependency
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,

    /// Replaced wholesale on reload, never mutated in place
    config: RwLock<Arc<CircuitBreakerConfig>>,

    state: Mutex<StateManager>,

    publisher: Option<EventPublisher>,
}

impl CircuitBreaker {
    /// Create a breaker from `config`. Out-of-range fields are reset to their
    /// defaults with a warning.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let (config, _rejected) = config.sanitized();

        info!(
            breaker = %config.name,
            enabled = config.enabled,
            failure_threshold = config.failure_threshold,
            timeout_ms = config.timeout_ms(),
            half_open_max_calls = config.half_open_max_calls,
            success_threshold = config.success_threshold,
            "🛡️ Circuit breaker initialized"
        );

        Self {
            name: config.name.clone(),
            state: Mutex::new(StateManager::new(config.max_history_size)),
            config: RwLock::new(Arc::new(config)),
            publisher: None,
        }
    }

    /// Publish transitions on `publisher` (when `metrics_enabled`)
    pub fn with_publisher(mut self, publisher: EventPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.state.lock().state()
    }

    /// Current configuration snapshot
    pub fn config(&self) -> Arc<CircuitBreakerConfig> {
        Arc::clone(&self.config.read())
    }

    /// Replace the configuration record. Calls already admitted finish under
    /// the snapshot they started with. Returns the values that were rejected.
    pub fn reload_config(&self, config: CircuitBreakerConfig) -> Vec<ConfigurationError> {
        let (mut config, warnings) = config.sanitized();
        if config.name != self.name {
            warn!(
                breaker = %self.name,
                requested_name = %config.name,
                "Ignoring name change on config reload"
            );
            config.name = self.name.clone();
        }

        self.state.lock().set_max_history_size(config.max_history_size);
        *self.config.write() = Arc::new(config);

        info!(breaker = %self.name, warnings = warnings.len(), "Circuit breaker configuration reloaded");
        warnings
    }

    /// Run `operation` under breaker protection.
    ///
    /// Rejected calls return [`CircuitBreakerError::Rejected`] without
    /// invoking the operation. Operation errors come back unchanged inside
    /// [`CircuitBreakerError::OperationFailed`].
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let config = self.config();
        if !config.enabled {
            return operation().await.map_err(CircuitBreakerError::OperationFailed);
        }

        self.admit(&config)?;

        let started = Instant::now();
        let result = operation().await;
        match &result {
            Ok(_) => self.on_success(&config, started.elapsed()),
            Err(_) => self.on_failure(&config),
        }

        result.map_err(CircuitBreakerError::OperationFailed)
    }

    /// Like [`execute`](Self::execute) for operations whose error type can
    /// carry a rejection itself. An `Err` counts as a failure and is handed
    /// back as-is; rejections are converted into `E`.
    pub async fn execute_with_result<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<AdmissionError>,
    {
        match self.execute(operation).await {
            Ok(value) => Ok(value),
            Err(CircuitBreakerError::Rejected(rejection)) => Err(E::from(rejection)),
            Err(CircuitBreakerError::OperationFailed(error)) => Err(error),
        }
    }

    /// Force the circuit open, e.g. while a backend is under maintenance
    pub fn force_open(&self, reason: &str) {
        warn!(breaker = %self.name, reason = %reason, "🚨 Circuit breaker forced open");
        let transition = self
            .state
            .lock()
            .transition_to(CircuitState::Open, reason, json!({ "forced": true }));
        self.emit(transition);
    }

    /// Force the circuit closed without waiting for recovery probes
    pub fn force_close(&self, reason: &str) {
        warn!(breaker = %self.name, reason = %reason, "🚨 Circuit breaker forced closed");
        let transition = self
            .state
            .lock()
            .transition_to(CircuitState::Closed, reason, json!({ "forced": true }));
        self.emit(transition);
    }

    /// Close the circuit and clear every counter. History is kept.
    pub fn reset(&self, reason: &str) {
        info!(breaker = %self.name, reason = %reason, "Circuit breaker reset");
        let transition = {
            let mut state = self.state.lock();
            let transition =
                state.transition_to(CircuitState::Closed, reason, json!({ "reset": true }));
            state.reset_counters();
            transition
        };
        self.emit(transition);
    }

    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let config = self.config();
        let state = self.state.lock();

        let total = state.total_request_count();
        let (success_rate, failure_rate) = if total == 0 {
            (1.0, 0.0)
        } else {
            (
                state.total_success_count() as f64 / total as f64,
                state.total_failure_count() as f64 / total as f64,
            )
        };

        CircuitBreakerMetrics {
            name: self.name.clone(),
            current_state: state.state(),
            failure_count: state.failure_count(),
            consecutive_success_count: state.consecutive_success_count(),
            half_open_call_count: state.half_open_call_count(),
            total_request_count: total,
            success_count: state.total_success_count(),
            total_failure_count: state.total_failure_count(),
            success_rate,
            failure_rate,
            average_duration: state.average_success_duration(),
            last_failure_time: state.last_failure_time(),
            last_state_change_time: state.last_state_change_time(),
            enabled: config.enabled,
            config: (*config).clone(),
        }
    }

    /// Transition history, oldest first, bounded by `max_history_size`
    pub fn state_history(&self) -> Vec<StateTransition> {
        self.state.lock().history()
    }

    /// An open circuit is the only unhealthy state
    pub fn is_healthy(&self) -> bool {
        self.state() != CircuitState::Open
    }

    fn admit(&self, config: &CircuitBreakerConfig) -> Result<(), AdmissionError> {
        let (outcome, transition) = {
            let mut state = self.state.lock();
            match state.state() {
                CircuitState::Closed => (Ok(()), None),
                CircuitState::Open => {
                    let elapsed = state.time_in_state();
                    if elapsed >= config.timeout {
                        let transition = state.transition_to(
                            CircuitState::HalfOpen,
                            reasons::TIMEOUT_ELAPSED,
                            json!({ "open_for_ms": elapsed.as_millis() as u64 }),
                        );
                        // The call that triggers recovery is the first trial call
                        state.try_claim_half_open_slot(config.half_open_max_calls);
                        (Ok(()), transition)
                    } else {
                        let rejection = AdmissionError::CircuitOpen {
                            name: self.name.clone(),
                            retry_after: config.timeout - elapsed,
                        };
                        (Err(rejection), None)
                    }
                }
                CircuitState::HalfOpen => {
                    if state.try_claim_half_open_slot(config.half_open_max_calls) {
                        (Ok(()), None)
                    } else {
                        let rejection = AdmissionError::HalfOpenLimit {
                            name: self.name.clone(),
                            max_calls: config.half_open_max_calls,
                        };
                        (Err(rejection), None)
                    }
                }
            }
        };

        self.emit(transition);
        if let Err(rejection) = &outcome {
            debug!(breaker = %self.name, error = %rejection, "Call rejected");
        }
        outcome
    }

    fn on_success(&self, config: &CircuitBreakerConfig, duration: Duration) {
        let transition = {
            let mut state = self.state.lock();
            let consecutive = state.record_success(duration);
            if state.state() == CircuitState::HalfOpen
                && consecutive >= u64::from(config.success_threshold)
            {
                state.transition_to(
                    CircuitState::Closed,
                    reasons::SUCCESS_THRESHOLD_REACHED,
                    json!({ "consecutive_successes": consecutive }),
                )
            } else {
                None
            }
        };

        debug!(
            breaker = %self.name,
            duration_ms = duration.as_millis() as u64,
            "🟢 Operation succeeded"
        );
        self.emit(transition);
    }

    fn on_failure(&self, config: &CircuitBreakerConfig) {
        let transition = {
            let mut state = self.state.lock();
            let failures = state.record_failure();
            match state.state() {
                CircuitState::Closed if failures >= u64::from(config.failure_threshold) => state
                    .transition_to(
                        CircuitState::Open,
                        reasons::FAILURE_THRESHOLD_REACHED,
                        json!({
                            "failure_count": failures,
                            "failure_threshold": config.failure_threshold,
                        }),
                    ),
                CircuitState::HalfOpen if config.reopen_on_half_open_failure => state.transition_to(
                    CircuitState::Open,
                    reasons::HALF_OPEN_PROBE_FAILED,
                    json!({ "failure_count": failures }),
                ),
                _ => None,
            }
        };

        debug!(breaker = %self.name, "🔴 Operation failed");
        self.emit(transition);
    }

    fn emit(&self, transition: Option<StateTransition>) {
        let Some(transition) = transition else {
            return;
        };

        log_breaker_transition(&self.name, &transition);

        if let Some(publisher) = &self.publisher {
            if self.config.read().metrics_enabled {
                publisher.publish(ResilienceEvent::StateTransition(StateTransitionEvent {
                    breaker_name: self.name.clone(),
                    transition,
                }));
            }
        }
    }
}
