//! Strategy factory settings (health polling cadence and probe limits).

use super::error::ConfigurationError;
use super::validation::{check_range, normalize_keys, FieldReader};
use crate::constants::{factory as defaults, keys};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

/// Configuration for the storage strategy factory and its health poller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageFactoryConfig {
    /// Delay between health polling rounds
    pub health_check_interval: Duration,

    /// Upper bound for a single backend probe
    pub health_probe_timeout: Duration,

    /// Probes allowed in flight during one round
    pub max_concurrent_probes: usize,
}

impl StorageFactoryConfig {
    /// Build from env-style key/value pairs
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
            health_check_interval: Duration::from_millis(reader.ranged_u64(
                keys::HEALTH_CHECK_INTERVAL_MS,
                defaults::MIN_HEALTH_CHECK_INTERVAL_MS,
                defaults::MAX_HEALTH_CHECK_INTERVAL_MS,
                defaults::DEFAULT_HEALTH_CHECK_INTERVAL_MS,
            )),
            health_probe_timeout: Duration::from_millis(reader.ranged_u64(
                keys::HEALTH_PROBE_TIMEOUT_MS,
                defaults::MIN_HEALTH_PROBE_TIMEOUT_MS,
                defaults::MAX_HEALTH_PROBE_TIMEOUT_MS,
                defaults::DEFAULT_HEALTH_PROBE_TIMEOUT_MS,
            )),
            max_concurrent_probes: reader.ranged_usize(
                keys::MAX_CONCURRENT_PROBES,
                defaults::MIN_MAX_CONCURRENT_PROBES,
                defaults::MAX_MAX_CONCURRENT_PROBES,
                defaults::DEFAULT_MAX_CONCURRENT_PROBES,
            ),
        };

        (config, reader.finish())
    }

    /// Interval in whole milliseconds, as reported in factory status
    pub fn health_check_interval_ms(&self) -> u64 {
        u64::try_from(self.health_check_interval.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn health_probe_timeout_ms(&self) -> u64 {
        u64::try_from(self.health_probe_timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Check every field against its accepted range
    pub fn validate(&self) -> Result<(), Vec<ConfigurationError>> {
        let errors: Vec<_> = [
            check_range(
                keys::HEALTH_CHECK_INTERVAL_MS,
                self.health_check_interval_ms(),
                defaults::MIN_HEALTH_CHECK_INTERVAL_MS,
                defaults::MAX_HEALTH_CHECK_INTERVAL_MS,
            ),
            check_range(
                keys::HEALTH_PROBE_TIMEOUT_MS,
                self.health_probe_timeout_ms(),
                defaults::MIN_HEALTH_PROBE_TIMEOUT_MS,
                defaults::MAX_HEALTH_PROBE_TIMEOUT_MS,
            ),
            check_range(
                keys::MAX_CONCURRENT_PROBES,
                self.max_concurrent_probes as u64,
                defaults::MIN_MAX_CONCURRENT_PROBES as u64,
                defaults::MAX_MAX_CONCURRENT_PROBES as u64,
            ),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Replace out-of-range fields with their defaults
    pub fn sanitized(mut self) -> (Self, Vec<ConfigurationError>) {
        let errors = self.validate().err().unwrap_or_default();

        for error in &errors {
            match error.field() {
                Some(keys::HEALTH_CHECK_INTERVAL_MS) => {
                    self.health_check_interval =
                        Duration::from_millis(defaults::DEFAULT_HEALTH_CHECK_INTERVAL_MS);
                }
                Some(keys::HEALTH_PROBE_TIMEOUT_MS) => {
                    self.health_probe_timeout =
                        Duration::from_millis(defaults::DEFAULT_HEALTH_PROBE_TIMEOUT_MS);
                }
                Some(keys::MAX_CONCURRENT_PROBES) => {
                    self.max_concurrent_probes = defaults::DEFAULT_MAX_CONCURRENT_PROBES;
                }
                _ => {}
            }
            warn!(error = %error, "Storage factory config value rejected, using default");
        }

        (self, errors)
    }
}

impl Default for StorageFactoryConfig {
    fn default() -> Self {
        Self {
            health_check_interval: Duration::from_millis(defaults::DEFAULT_HEALTH_CHECK_INTERVAL_MS),
            health_probe_timeout: Duration::from_millis(defaults::DEFAULT_HEALTH_PROBE_TIMEOUT_MS),
            max_concurrent_probes: defaults::DEFAULT_MAX_CONCURRENT_PROBES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_config_from_map() {
        let (config, warnings) = StorageFactoryConfig::from_map([
            ("HEALTH_CHECK_INTERVAL_MS", "5000"),
            ("HEALTH_PROBE_TIMEOUT_MS", "10"),
            ("MAX_CONCURRENT_PROBES", "4"),
        ]);

        assert_eq!(config.health_check_interval, Duration::from_secs(5));
        assert_eq!(config.health_probe_timeout, Duration::from_millis(5_000));
        assert_eq!(config.max_concurrent_probes, 4);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field(), Some("HEALTH_PROBE_TIMEOUT_MS"));
    }

    #[test]
    fn test_sanitized_replaces_out_of_range_fields() {
        let config = StorageFactoryConfig {
            health_check_interval: Duration::ZERO,
            health_probe_timeout: Duration::from_millis(250),
            max_concurrent_probes: 0,
        };

        let (fixed, errors) = config.sanitized();
        assert_eq!(errors.len(), 2);
        assert_eq!(fixed.health_check_interval, Duration::from_secs(30));
        assert_eq!(fixed.health_probe_timeout, Duration::from_millis(250));
        assert_eq!(fixed.max_concurrent_probes, 8);
        assert!(fixed.validate().is_ok());
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(StorageFactoryConfig::default().validate().is_ok());
    }
}
