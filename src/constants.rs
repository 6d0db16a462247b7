//! # System Constants
//!
//! Configuration keys, defaults and accepted ranges for circuit breakers and
//! the storage strategy factory. Keys are the env-style names accepted by the
//! configuration loader (case-insensitive, optionally prefixed).

/// Configuration keys
pub mod keys {
    pub const FAILURE_THRESHOLD: &str = "FAILURE_THRESHOLD";
    pub const TIMEOUT_MS: &str = "TIMEOUT_MS";
    pub const HALF_OPEN_MAX_CALLS: &str = "HALF_OPEN_MAX_CALLS";
    pub const SUCCESS_THRESHOLD: &str = "SUCCESS_THRESHOLD";
    pub const MAX_HISTORY_SIZE: &str = "MAX_HISTORY_SIZE";
    pub const ENABLED: &str = "ENABLED";
    pub const METRICS_ENABLED: &str = "METRICS_ENABLED";
    pub const NAME: &str = "NAME";
    pub const REOPEN_ON_HALF_OPEN_FAILURE: &str = "REOPEN_ON_HALF_OPEN_FAILURE";

    pub const HEALTH_CHECK_INTERVAL_MS: &str = "HEALTH_CHECK_INTERVAL_MS";
    pub const HEALTH_PROBE_TIMEOUT_MS: &str = "HEALTH_PROBE_TIMEOUT_MS";
    pub const MAX_CONCURRENT_PROBES: &str = "MAX_CONCURRENT_PROBES";
}

/// Circuit breaker defaults and bounds (inclusive)
pub mod breaker {
    pub const DEFAULT_NAME: &str = "default";

    pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
    pub const MIN_FAILURE_THRESHOLD: u32 = 1;
    pub const MAX_FAILURE_THRESHOLD: u32 = 100;

    pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
    pub const MIN_TIMEOUT_MS: u64 = 1_000;
    pub const MAX_TIMEOUT_MS: u64 = 300_000;

    pub const DEFAULT_HALF_OPEN_MAX_CALLS: u32 = 3;
    pub const MIN_HALF_OPEN_MAX_CALLS: u32 = 1;
    pub const MAX_HALF_OPEN_MAX_CALLS: u32 = 50;

    pub const DEFAULT_SUCCESS_THRESHOLD: u32 = 3;
    pub const MIN_SUCCESS_THRESHOLD: u32 = 1;
    pub const MAX_SUCCESS_THRESHOLD: u32 = 20;

    pub const DEFAULT_MAX_HISTORY_SIZE: usize = 100;
    pub const MIN_MAX_HISTORY_SIZE: usize = 10;
    pub const MAX_MAX_HISTORY_SIZE: usize = 1_000;

    pub const DEFAULT_ENABLED: bool = true;
    pub const DEFAULT_METRICS_ENABLED: bool = true;
    pub const DEFAULT_REOPEN_ON_HALF_OPEN_FAILURE: bool = true;
}

/// Strategy factory defaults and bounds (inclusive)
pub mod factory {
    pub const DEFAULT_HEALTH_CHECK_INTERVAL_MS: u64 = 30_000;
    pub const MIN_HEALTH_CHECK_INTERVAL_MS: u64 = 1_000;
    pub const MAX_HEALTH_CHECK_INTERVAL_MS: u64 = 3_600_000;

    pub const DEFAULT_HEALTH_PROBE_TIMEOUT_MS: u64 = 5_000;
    pub const MIN_HEALTH_PROBE_TIMEOUT_MS: u64 = 100;
    pub const MAX_HEALTH_PROBE_TIMEOUT_MS: u64 = 60_000;

    pub const DEFAULT_MAX_CONCURRENT_PROBES: usize = 8;
    pub const MIN_MAX_CONCURRENT_PROBES: usize = 1;
    pub const MAX_MAX_CONCURRENT_PROBES: usize = 64;

    /// Priority that marks the primary strategy
    pub const PRIMARY_PRIORITY: u32 = 1;
}

/// Transition reasons recorded in breaker history
pub mod reasons {
    pub const FAILURE_THRESHOLD_REACHED: &str = "failure threshold reached";
    pub const TIMEOUT_ELAPSED: &str = "timeout elapsed";
    pub const SUCCESS_THRESHOLD_REACHED: &str = "success threshold reached";
    pub const HALF_OPEN_PROBE_FAILED: &str = "half-open probe failed";
}

/// Environment variables read by the loader and logging setup
pub mod env {
    pub const DEFAULT_PREFIX: &str = "STORAGE_RESILIENCE";
    pub const ENVIRONMENT: &str = "STORAGE_RESILIENCE_ENV";
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
}

/// Default broadcast capacity of the event publisher
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1_000;
