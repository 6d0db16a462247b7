mod common;

use common::FactoryBuilder;
use storage_resilience::storage::{HealthStatus, StrategyConfig, StrategyType};

#[tokio::test]
async fn test_select_best_returns_only_healthy_strategy() {
    common::init_test_logging();
    let (factory, strategies) = FactoryBuilder::new()
        .with_strategy("p1", StrategyType::S3, 1)
        .with_strategy("p2", StrategyType::Azure, 2)
        .with_strategy("p3", StrategyType::Local, 3)
        .with_strategy("p4", StrategyType::Gcs, 4)
        .with_strategy("p5", StrategyType::Memory, 5)
        .build();

    for (i, strategy) in strategies.iter().enumerate() {
        if i != 2 {
            strategy.set_health(HealthStatus::Unhealthy);
        }
    }
    factory.check_health_now().await;

    let best = factory.select_best_strategy(None).unwrap();
    assert_eq!(best.id(), "p3");
    assert_eq!(best.config().priority, 3);
}

#[tokio::test]
async fn test_fallback_picks_next_priority_after_failed() {
    let (factory, _strategies) = FactoryBuilder::new()
        .with_strategy("s3", StrategyType::S3, 1)
        .with_strategy("local", StrategyType::Local, 3)
        .with_strategy("azure", StrategyType::Azure, 2)
        .build();

    let fallback = factory.get_fallback_strategy("s3").unwrap();
    assert_eq!(fallback.id(), "azure");

    let next = factory.get_fallback_strategy("azure").unwrap();
    assert_eq!(next.id(), "local");

    assert!(factory.get_fallback_strategy("local").is_none());
}

#[tokio::test]
async fn test_fallback_skips_disabled_and_non_fallback_strategies() {
    let (factory, _strategies) = FactoryBuilder::new()
        .with_strategy("s3", StrategyType::S3, 1)
        .with_config(StrategyConfig::new("azure", "Azure", StrategyType::Azure, 2).disabled())
        .with_config(StrategyConfig::new("gcs", "GCS", StrategyType::Gcs, 3).without_fallback())
        .with_strategy("local", StrategyType::Local, 4)
        .build();

    assert_eq!(factory.get_fallback_strategy("s3").unwrap().id(), "local");
}

#[tokio::test]
async fn test_degraded_selection_when_nothing_is_healthy() {
    let (factory, strategies) = FactoryBuilder::new()
        .with_strategy("s3", StrategyType::S3, 2)
        .with_strategy("local", StrategyType::Local, 1)
        .build();
    for strategy in &strategies {
        strategy.set_health(HealthStatus::Degraded);
    }
    factory.check_health_now().await;

    // Degraded is not healthy, so selection falls back to plain priority
    assert_eq!(factory.select_best_strategy(None).unwrap().id(), "local");

    let status = factory.get_status();
    assert_eq!(status.degraded_strategies, 2);
    assert_eq!(status.healthy_strategies, 0);
}

#[tokio::test]
async fn test_ties_break_by_registration_order() {
    let (factory, _strategies) = FactoryBuilder::new()
        .with_strategy("first", StrategyType::S3, 2)
        .with_strategy("second", StrategyType::S3, 2)
        .build();
    factory.check_health_now().await;

    assert_eq!(factory.select_best_strategy(None).unwrap().id(), "first");
    assert_eq!(factory.get_primary_strategy().unwrap().id(), "first");
}

#[tokio::test]
async fn test_preferred_type_filters_selection() {
    let (factory, strategies) = FactoryBuilder::new()
        .with_strategy("local", StrategyType::Local, 1)
        .with_strategy("s3-east", StrategyType::S3, 2)
        .with_strategy("s3-west", StrategyType::S3, 3)
        .build();
    strategies[1].set_health(HealthStatus::Unhealthy);
    factory.check_health_now().await;

    let best = factory.select_best_strategy(Some(StrategyType::S3)).unwrap();
    assert_eq!(best.id(), "s3-west");
    assert!(factory.select_best_strategy(Some(StrategyType::Gcs)).is_none());
}

#[tokio::test]
async fn test_status_and_cached_health_reads() {
    let (factory, strategies) = FactoryBuilder::new()
        .with_strategy("local", StrategyType::Local, 1)
        .with_config(StrategyConfig::new("s3", "S3", StrategyType::S3, 2).disabled())
        .with_strategy("azure", StrategyType::Azure, 3)
        .build();

    assert!(factory.get_strategy_health("local").is_none());
    let before = factory.get_status();
    assert_eq!(before.total_strategies, 3);
    assert_eq!(before.enabled_strategies, 2);
    assert_eq!(before.healthy_strategies, 0);
    assert_eq!(before.primary_strategy_name.as_deref(), Some("LOCAL"));
    assert_eq!(before.health_check_interval_ms, 30_000);

    strategies[2].fail_health_probe("credentials expired");
    factory.check_health_now().await;

    // Reads come from the cache: changing the script has no effect until the next round
    strategies[2].set_health(HealthStatus::Healthy);
    let azure = factory.get_strategy_health("azure").unwrap();
    assert_eq!(azure.status, HealthStatus::Unhealthy);

    let all = factory.get_all_strategy_health();
    let ids: Vec<_> = all.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["azure", "local", "s3"]);

    let after = factory.get_status();
    assert_eq!(after.healthy_strategies, 2);
    assert_eq!(after.unhealthy_strategies, 1);
}
