//! Configuration Loader
//!
//! Merges an optional configuration file with prefixed environment variables
//! (environment wins) and resolves the result into typed breaker and factory
//! configs. Bad field values only produce warnings; a missing or unparseable
//! file is the one hard failure.

use super::circuit_breaker::CircuitBreakerConfig;
use super::error::{ConfigResult, ConfigurationError};
use super::factory::StorageFactoryConfig;
use super::validation::normalize_keys;
use crate::constants::env;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Effective configuration plus every value that was rejected on the way
#[derive(Debug, Clone, Serialize)]
pub struct LoadedConfig {
    pub breaker: CircuitBreakerConfig,
    pub factory: StorageFactoryConfig,
    #[serde(serialize_with = "serialize_warnings")]
    pub warnings: Vec<ConfigurationError>,
}

fn serialize_warnings<S>(warnings: &[ConfigurationError], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(warnings.iter().map(ToString::to_string))
}

impl LoadedConfig {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Builder-style loader over the `config` crate
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    prefix: String,
    file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Loader reading `STORAGE_RESILIENCE_*` environment variables
    pub fn new() -> Self {
        Self {
            prefix: env::DEFAULT_PREFIX.to_string(),
            file: None,
        }
    }

    /// Use a different environment variable prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Also read a configuration file (format inferred from its extension)
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Load from the configured file and environment
    pub fn load(&self) -> ConfigResult<LoadedConfig> {
        let mut builder = config::Config::builder();

        if let Some(path) = &self.file {
            Self::check_file(path)?;
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }

        builder = builder.add_source(config::Environment::with_prefix(&self.prefix));

        let source_name = self
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| format!("{}_* environment", self.prefix));

        let merged = builder
            .build()
            .map_err(|e| ConfigurationError::parse_error(&source_name, e))?;

        let raw: HashMap<String, config::Value> = merged
            .try_deserialize()
            .map_err(|e| ConfigurationError::parse_error(&source_name, e))?;

        let mut values = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            match value.into_string() {
                Ok(s) => {
                    values.insert(key, s);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Ignoring non-scalar configuration entry");
                }
            }
        }

        let loaded = Self::load_from_map(values);

        info!(
            source = %source_name,
            breaker = %loaded.breaker.name,
            failure_threshold = loaded.breaker.failure_threshold,
            timeout_ms = loaded.breaker.timeout_ms(),
            health_check_interval_ms = loaded.factory.health_check_interval_ms(),
            warnings = loaded.warnings.len(),
            "Configuration loaded"
        );

        Ok(loaded)
    }

    /// Resolve an in-memory key/value map; never fails
    pub fn load_from_map<I, K, V>(entries: I) -> LoadedConfig
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let values = normalize_keys(entries);
        debug!(keys = ?values.keys().collect::<Vec<_>>(), "Resolving configuration values");

        let (breaker, mut warnings) = CircuitBreakerConfig::from_normalized(&values);
        let (factory, factory_warnings) = StorageFactoryConfig::from_normalized(&values);
        warnings.extend(factory_warnings);

        LoadedConfig {
            breaker,
            factory,
            warnings,
        }
    }

    fn check_file(path: &Path) -> ConfigResult<()> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| ConfigurationError::file_read_error(path.display().to_string(), e))?;

        if !metadata.is_file() {
            return Err(ConfigurationError::file_read_error(
                path.display().to_string(),
                "path is not a regular file",
            ));
        }

        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigurationError::file_read_error(
                path.display().to_string(),
                format!("file too large ({} bytes)", metadata.len()),
            ));
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
