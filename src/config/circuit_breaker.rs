//! # Circuit Breaker Configuration
//!
//! Immutable per-breaker settings. Values read from env-style maps are
//! validated field by field; anything missing or invalid falls back to its
//! default so a bad setting never prevents startup.

use super::error::ConfigurationError;
use super::validation::{check_range, normalize_keys, parse_name, FieldReader};
use crate::constants::{breaker as defaults, keys};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

/// Configuration for a single circuit breaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Dependency name the breaker guards
    pub name: String,

    /// Failures counted while closed before the circuit opens
    pub failure_threshold: u32,

    /// Time to wait in open state before admitting a recovery probe
    pub timeout: Duration,

    /// Calls admitted while half-open
    pub half_open_max_calls: u32,

    /// Consecutive half-open successes needed to close the circuit
    pub success_threshold: u32,

    /// Transition records kept in history
    pub max_history_size: usize,

    /// When false, `execute` runs operations without any gating
    pub enabled: bool,

    /// Publish transition events
    pub metrics_enabled: bool,

    /// Reopen immediately when a half-open probe fails
    pub reopen_on_half_open_failure: bool,
}

impl CircuitBreakerConfig {
    /// Default configuration carrying the given dependency name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Preset for local disk backends: trip quickly, recover quickly
    pub fn for_local_storage(name: impl Into<String>) -> Self {
        Self {
            failure_threshold: 3,
            timeout: Duration::from_secs(10),
            success_threshold: 2,
            half_open_max_calls: 2,
            ..Self::named(name)
        }
    }

    /// Preset for remote object stores: tolerate more noise, back off longer
    pub fn for_remote_storage(name: impl Into<String>) -> Self {
        Self {
            failure_threshold: 5,
            timeout: Duration::from_secs(60),
            success_threshold: 3,
            half_open_max_calls: 3,
            ..Self::named(name)
        }
    }

    /// Build from env-style key/value pairs, returning the rejected values
    /// as warnings alongside the effective configuration.
    pub fn from_map<I, K, V>(entries: I) -> (Self, Vec<ConfigurationError>)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let values = normalize_keys(entries);
        Self::from_normalized(&values)
    }

    pub(crate) fn from_normalized(values: &HashMap<String, String>) -> (Self, Vec<ConfigurationError>) {
        let mut reader = FieldReader::new(values);

        let config = Self {
            name: reader.name(keys::NAME, defaults::DEFAULT_NAME),
            failure_threshold: reader.ranged_u32(
                keys::FAILURE_THRESHOLD,
                defaults::MIN_FAILURE_THRESHOLD,
                defaults::MAX_FAILURE_THRESHOLD,
                defaults::DEFAULT_FAILURE_THRESHOLD,
            ),
            timeout: Duration::from_millis(reader.ranged_u64(
                keys::TIMEOUT_MS,
                defaults::MIN_TIMEOUT_MS,
                defaults::MAX_TIMEOUT_MS,
                defaults::DEFAULT_TIMEOUT_MS,
            )),
            half_open_max_calls: reader.ranged_u32(
                keys::HALF_OPEN_MAX_CALLS,
                defaults::MIN_HALF_OPEN_MAX_CALLS,
                defaults::MAX_HALF_OPEN_MAX_CALLS,
                defaults::DEFAULT_HALF_OPEN_MAX_CALLS,
            ),
            success_threshold: reader.ranged_u32(
                keys::SUCCESS_THRESHOLD,
                defaults::MIN_SUCCESS_THRESHOLD,
                defaults::MAX_SUCCESS_THRESHOLD,
                defaults::DEFAULT_SUCCESS_THRESHOLD,
            ),
            max_history_size: reader.ranged_usize(
                keys::MAX_HISTORY_SIZE,
                defaults::MIN_MAX_HISTORY_SIZE,
                defaults::MAX_MAX_HISTORY_SIZE,
                defaults::DEFAULT_MAX_HISTORY_SIZE,
            ),
            enabled: reader.boolean(keys::ENABLED, defaults::DEFAULT_ENABLED),
            metrics_enabled: reader.boolean(keys::METRICS_ENABLED, defaults::DEFAULT_METRICS_ENABLED),
            reopen_on_half_open_failure: reader.boolean(
                keys::REOPEN_ON_HALF_OPEN_FAILURE,
                defaults::DEFAULT_REOPEN_ON_HALF_OPEN_FAILURE,
            ),
        };

        (config, reader.finish())
    }

    /// Timeout in whole milliseconds
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Check every field against its accepted range
    pub fn validate(&self) -> Result<(), Vec<ConfigurationError>> {
        let mut errors: Vec<_> = self
            .field_checks()
            .into_iter()
            .filter_map(Result::err)
            .collect();
        if let Err(e) = parse_name(keys::NAME, &self.name) {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn field_checks(&self) -> Vec<Result<u64, ConfigurationError>> {
        vec![
            check_range(
                keys::FAILURE_THRESHOLD,
                u64::from(self.failure_threshold),
                u64::from(defaults::MIN_FAILURE_THRESHOLD),
                u64::from(defaults::MAX_FAILURE_THRESHOLD),
            ),
            check_range(
                keys::TIMEOUT_MS,
                self.timeout_ms(),
                defaults::MIN_TIMEOUT_MS,
                defaults::MAX_TIMEOUT_MS,
            ),
            check_range(
                keys::HALF_OPEN_MAX_CALLS,
                u64::from(self.half_open_max_calls),
                u64::from(defaults::MIN_HALF_OPEN_MAX_CALLS),
                u64::from(defaults::MAX_HALF_OPEN_MAX_CALLS),
            ),
            check_range(
                keys::SUCCESS_THRESHOLD,
                u64::from(self.success_threshold),
                u64::from(defaults::MIN_SUCCESS_THRESHOLD),
                u64::from(defaults::MAX_SUCCESS_THRESHOLD),
            ),
            check_range(
                keys::MAX_HISTORY_SIZE,
                self.max_history_size as u64,
                defaults::MIN_MAX_HISTORY_SIZE as u64,
                defaults::MAX_MAX_HISTORY_SIZE as u64,
            ),
        ]
    }

    /// Replace out-of-range fields with their defaults.
    ///
    /// Used when a breaker is constructed from a programmatically built
    /// config, so the same validate-or-default policy applies as for
    /// env-style input.
    pub fn sanitized(mut self) -> (Self, Vec<ConfigurationError>) {
        let errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        };

        for error in &errors {
            match error.field() {
                Some(keys::FAILURE_THRESHOLD) => {
                    self.failure_threshold = defaults::DEFAULT_FAILURE_THRESHOLD;
                }
                Some(keys::TIMEOUT_MS) => {
                    self.timeout = Duration::from_millis(defaults::DEFAULT_TIMEOUT_MS);
                }
                Some(keys::HALF_OPEN_MAX_CALLS) => {
                    self.half_open_max_calls = defaults::DEFAULT_HALF_OPEN_MAX_CALLS;
                }
                Some(keys::SUCCESS_THRESHOLD) => {
                    self.success_threshold = defaults::DEFAULT_SUCCESS_THRESHOLD;
                }
                Some(keys::MAX_HISTORY_SIZE) => {
                    self.max_history_size = defaults::DEFAULT_MAX_HISTORY_SIZE;
                }
                Some(keys::NAME) => {
                    self.name = defaults::DEFAULT_NAME.to_string();
                }
                _ => {}
            }
            warn!(
                breaker = %self.name,
                error = %error,
                "Circuit breaker config value rejected, using default"
            );
        }

        if self.success_threshold > self.half_open_max_calls {
            warn!(
                breaker = %self.name,
                success_threshold = self.success_threshold,
                half_open_max_calls = self.half_open_max_calls,
                "success_threshold exceeds half_open_max_calls; a half-open circuit can only close via manual override"
            );
        }

        (self, errors)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            name: defaults::DEFAULT_NAME.to_string(),
            failure_threshold: defaults::DEFAULT_FAILURE_THRESHOLD,
            timeout: Duration::from_millis(defaults::DEFAULT_TIMEOUT_MS),
            half_open_max_calls: defaults::DEFAULT_HALF_OPEN_MAX_CALLS,
            success_threshold: defaults::DEFAULT_SUCCESS_THRESHOLD,
            max_history_size: defaults::DEFAULT_MAX_HISTORY_SIZE,
            enabled: defaults::DEFAULT_ENABLED,
            metrics_enabled: defaults::DEFAULT_METRICS_ENABLED,
            reopen_on_half_open_failure: defaults::DEFAULT_REOPEN_ON_HALF_OPEN_FAILURE,
        }
    }
}
