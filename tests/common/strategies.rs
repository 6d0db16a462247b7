use proptest::prelude::*;
use storage_resilience::storage::{HealthStatus, StrategyConfig, StrategyType};

/// Strategy for generating backend types
pub fn strategy_type_strategy() -> impl Strategy<Value = StrategyType> {
    prop_oneof![
        Just(StrategyType::Local),
        Just(StrategyType::S3),
        Just(StrategyType::Azure),
        Just(StrategyType::Gcs),
        Just(StrategyType::Memory),
    ]
}

/// Strategy for generating health statuses
pub fn health_status_strategy() -> impl Strategy<Value = HealthStatus> {
    prop_oneof![
        Just(HealthStatus::Healthy),
        Just(HealthStatus::Degraded),
        Just(HealthStatus::Unhealthy),
    ]
}

/// Strategy for generating a registry of 1..=8 strategy configs with unique
/// ids, each paired with the health its probe will report
pub fn registry_strategy() -> impl Strategy<Value = Vec<(StrategyConfig, HealthStatus)>> {
    prop::collection::vec(
        (
            strategy_type_strategy(),
            1u32..=6,
            any::<bool>(),
            any::<bool>(),
            health_status_strategy(),
        ),
        1..=8,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (strategy_type, priority, enabled, allow_fallback, health))| {
                let id = format!("strategy-{i}");
                let config = StrategyConfig {
                    id: id.clone(),
                    name: id,
                    strategy_type,
                    priority,
                    enabled,
                    allow_fallback,
                };
                (config, health)
            })
            .collect()
    })
}

/// Sequence of operation outcomes fed through a breaker (`true` = success)
pub fn outcome_sequence_strategy() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 0..200)
}
