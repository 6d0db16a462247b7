//! # Structured Logging Module
//!
//! Environment-aware structured logging for breaker transitions, strategy
//! selection and health polling.

use crate::constants::env;
use crate::resilience::StateTransition;
use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// `RUST_LOG` wins when set; otherwise the level follows
/// `STORAGE_RESILIENCE_ENV`. `LOG_FORMAT=json` switches to JSON lines.
/// Safe to call more than once.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));

        let layer = if use_json_format() {
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_filter(filter)
                .boxed()
        };

        // A global subscriber may already be installed by the host application
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var(env::ENVIRONMENT)
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        "test" | "development" => "debug".to_string(),
        _ => "debug".to_string(),
    }
}

fn use_json_format() -> bool {
    std::env::var(env::LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Log a breaker state transition. Opening is logged at error level since it
/// means a dependency is being cut off.
pub fn log_breaker_transition(breaker: &str, transition: &StateTransition) {
    use crate::resilience::CircuitState;

    match transition.to {
        CircuitState::Open => tracing::error!(
            breaker = %breaker,
            from = %transition.from,
            to = %transition.to,
            reason = %transition.reason,
            metadata = %transition.metadata,
            timestamp = %transition.timestamp.to_rfc3339(),
            "CIRCUIT_BREAKER_TRANSITION"
        ),
        CircuitState::HalfOpen | CircuitState::Closed => tracing::info!(
            breaker = %breaker,
            from = %transition.from,
            to = %transition.to,
            reason = %transition.reason,
            metadata = %transition.metadata,
            timestamp = %transition.timestamp.to_rfc3339(),
            "CIRCUIT_BREAKER_TRANSITION"
        ),
    }
}

/// Log structured data for storage strategy operations
pub fn log_strategy_operation(
    operation: &str,
    strategy_id: &str,
    status: &str,
    duration_ms: Option<u64>,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        strategy_id = %strategy_id,
        status = %status,
        duration_ms = duration_ms,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "STORAGE_OPERATION"
    );
}
