use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use storage_resilience::config::CircuitBreakerConfig;
use storage_resilience::resilience::CircuitBreaker;
use storage_resilience::storage::{StrategyConfig, StrategyFactory, StrategyType};
use storage_resilience::test_helpers::InMemoryStrategy;

fn benchmark_closed_breaker_execute(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");
    let breaker = CircuitBreaker::new(CircuitBreakerConfig::named("bench"));

    c.bench_function("closed_breaker_execute", |b| {
        b.iter(|| {
            runtime.block_on(async {
                breaker
                    .execute(|| async { Ok::<_, ()>(black_box(1u64)) })
                    .await
            })
        })
    });
}

fn benchmark_open_breaker_rejection(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");
    let breaker = CircuitBreaker::new(CircuitBreakerConfig::named("bench"));
    breaker.force_open("benchmark");

    c.bench_function("open_breaker_rejection", |b| {
        b.iter(|| {
            runtime.block_on(async {
                breaker
                    .execute(|| async { Ok::<_, ()>(black_box(1u64)) })
                    .await
            })
        })
    });
}

fn benchmark_strategy_selection(c: &mut Criterion) {
    let factory = StrategyFactory::default();
    for priority in 1..=16u32 {
        let id = format!("memory-{priority}");
        factory
            .register_strategy(
                Arc::new(InMemoryStrategy::new(&id)),
                StrategyConfig::new(&id, &id, StrategyType::Memory, priority),
            )
            .expect("register");
    }

    c.bench_function("select_best_strategy_16", |b| {
        b.iter(|| factory.select_best_strategy(black_box(None)))
    });

    c.bench_function("get_fallback_strategy_16", |b| {
        b.iter(|| factory.get_fallback_strategy(black_box("memory-1")))
    });
}

criterion_group!(
    benches,
    benchmark_closed_breaker_execute,
    benchmark_open_breaker_rejection,
    benchmark_strategy_selection
);
criterion_main!(benches);
