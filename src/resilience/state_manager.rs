//! # Breaker State Manager
//!
//! Holds one breaker's current state, its counters and a bounded history of
//! transitions. The manager applies the bookkeeping rules; deciding *when* to
//! transition is left to [`CircuitBreaker`](super::CircuitBreaker).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed,
    /// Failure mode - all calls fail fast without executing
    Open,
    /// Testing recovery - limited calls allowed to test backend health
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a breaker's transition history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: CircuitState,
    pub to: CircuitState,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

/// A transition as published to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransitionEvent {
    pub breaker_name: String,
    #[serde(flatten)]
    pub transition: StateTransition,
}

/// State, counters and history for a single breaker
#[derive(Debug)]
pub struct StateManager {
    state: CircuitState,

    /// Failures since the circuit last closed
    failure_count: u64,
    consecutive_success_count: u64,
    total_request_count: u64,
    total_success_count: u64,
    total_failure_count: u64,
    half_open_call_count: u64,
    total_success_duration: Duration,

    last_failure_time: Option<DateTime<Utc>>,
    last_state_change_time: DateTime<Utc>,
    /// Monotonic twin of `last_state_change_time`, used for timeout checks
    last_state_change_instant: Instant,

    history: VecDeque<StateTransition>,
    max_history_size: usize,
}

impl StateManager {
    pub fn new(max_history_size: usize) -> Self {
        let max_history_size = max_history_size.max(1);
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            consecutive_success_count: 0,
            total_request_count: 0,
            total_success_count: 0,
            total_failure_count: 0,
            half_open_call_count: 0,
            total_success_duration: Duration::ZERO,
            last_failure_time: None,
            last_state_change_time: Utc::now(),
            last_state_change_instant: Instant::now(),
            history: VecDeque::with_capacity(max_history_size),
            max_history_size,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    pub fn consecutive_success_count(&self) -> u64 {
        self.consecutive_success_count
    }

    pub fn total_request_count(&self) -> u64 {
        self.total_request_count
    }

    pub fn total_success_count(&self) -> u64 {
        self.total_success_count
    }

    pub fn total_failure_count(&self) -> u64 {
        self.total_failure_count
    }

    pub fn half_open_call_count(&self) -> u64 {
        self.half_open_call_count
    }

    pub fn last_failure_time(&self) -> Option<DateTime<Utc>> {
        self.last_failure_time
    }

    pub fn last_state_change_time(&self) -> DateTime<Utc> {
        self.last_state_change_time
    }

    /// Mean duration of successful calls
    pub fn average_success_duration(&self) -> Duration {
        if self.total_success_count == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_success_duration.as_nanos() / u128::from(self.total_success_count);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Time spent in the current state
    pub fn time_in_state(&self) -> Duration {
        self.last_state_change_instant.elapsed()
    }

    /// Record a success; returns the new consecutive success count
    pub fn record_success(&mut self, duration: Duration) -> u64 {
        self.consecutive_success_count += 1;
        self.total_request_count += 1;
        self.total_success_count += 1;
        self.total_success_duration += duration;
        self.consecutive_success_count
    }

    /// Record a failure; returns the failure count since the last close.
    ///
    /// Failures that complete while the circuit is open (the call was admitted
    /// before a forced open) are counted in totals only.
    pub fn record_failure(&mut self) -> u64 {
        if self.state != CircuitState::Open {
            self.failure_count += 1;
        }
        self.total_request_count += 1;
        self.total_failure_count += 1;
        self.consecutive_success_count = 0;
        self.last_failure_time = Some(Utc::now());
        self.failure_count
    }

    /// Claim a half-open slot if one is free
    pub fn try_claim_half_open_slot(&mut self, max_calls: u32) -> bool {
        if self.half_open_call_count >= u64::from(max_calls) {
            return false;
        }
        self.half_open_call_count += 1;
        true
    }

    /// Move to `to`, recording the transition. Returns `None` when the
    /// breaker is already in that state.
    pub fn transition_to(
        &mut self,
        to: CircuitState,
        reason: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Option<StateTransition> {
        if self.state == to {
            return None;
        }

        let record = StateTransition {
            from: self.state,
            to,
            reason: reason.into(),
            timestamp: Utc::now(),
            metadata,
        };

        self.state = to;
        self.last_state_change_time = record.timestamp;
        self.last_state_change_instant = Instant::now();
        self.half_open_call_count = 0;
        self.consecutive_success_count = 0;
        if to == CircuitState::Closed {
            self.failure_count = 0;
        }

        self.push_history(record.clone());
        Some(record)
    }

    /// Clear every counter; state and history are kept
    pub fn reset_counters(&mut self) {
        self.failure_count = 0;
        self.consecutive_success_count = 0;
        self.total_request_count = 0;
        self.total_success_count = 0;
        self.total_failure_count = 0;
        self.half_open_call_count = 0;
        self.total_success_duration = Duration::ZERO;
        self.last_failure_time = None;
    }

    /// Change the history bound, evicting the oldest entries if needed
    pub fn set_max_history_size(&mut self, max_history_size: usize) {
        self.max_history_size = max_history_size.max(1);
        self.trim_history();
    }

    /// Transition history, oldest first
    pub fn history(&self) -> Vec<StateTransition> {
        self.history.iter().cloned().collect()
    }

    fn push_history(&mut self, record: StateTransition) {
        self.history.push_back(record);
        self.trim_history();
    }

    fn trim_history(&mut self) {
        while self.history.len() > self.max_history_size {
            self.history.pop_front();
        }
    }
}
