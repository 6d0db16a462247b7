mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storage_resilience::config::CircuitBreakerConfig;
use storage_resilience::constants::reasons;
use storage_resilience::events::{EventPublisher, ResilienceEvent};
use storage_resilience::resilience::{
    AdmissionError, CircuitBreaker, CircuitBreakerError, CircuitState,
};
use tokio::sync::Semaphore;

fn scenario_a_config() -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        failure_threshold: 3,
        timeout: Duration::from_millis(1_000),
        success_threshold: 2,
        ..CircuitBreakerConfig::named("scenario-a")
    }
}

#[tokio::test(start_paused = true)]
async fn test_open_timeout_half_open_close_cycle() {
    common::init_test_logging();
    let breaker = CircuitBreaker::new(scenario_a_config());
    let invocations = AtomicUsize::new(0);

    for _ in 0..3 {
        let result = breaker
            .execute(|| async {
                invocations.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("backend down".to_string())
            })
            .await;
        assert!(matches!(result, Err(CircuitBreakerError::OperationFailed(ref e)) if e == "backend down"));
    }
    assert_eq!(breaker.state(), CircuitState::Open);
    assert_eq!(invocations.load(Ordering::SeqCst), 3);

    // Immediately after opening: rejected, operation untouched
    let result = breaker
        .execute(|| async {
            invocations.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(())
        })
        .await;
    assert!(matches!(
        result,
        Err(CircuitBreakerError::Rejected(AdmissionError::CircuitOpen { .. }))
    ));
    assert_eq!(invocations.load(Ordering::SeqCst), 3);

    tokio::time::sleep(Duration::from_millis(1_000)).await;

    breaker
        .execute(|| async {
            invocations.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(())
        })
        .await
        .unwrap();
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
    assert_eq!(invocations.load(Ordering::SeqCst), 4);

    breaker
        .execute(|| async { Ok::<_, String>(()) })
        .await
        .unwrap();
    assert_eq!(breaker.state(), CircuitState::Closed);

    let metrics = breaker.metrics();
    assert_eq!(metrics.failure_count, 0);
    assert_eq!(metrics.half_open_call_count, 0);
    assert_eq!(metrics.total_request_count, 5);
    assert!((metrics.success_rate - 0.4).abs() < f64::EPSILON);

    let history = breaker.state_history();
    let path: Vec<_> = history.iter().map(|t| (t.from, t.to)).collect();
    assert_eq!(
        path,
        vec![
            (CircuitState::Closed, CircuitState::Open),
            (CircuitState::Open, CircuitState::HalfOpen),
            (CircuitState::HalfOpen, CircuitState::Closed),
        ]
    );
    assert_eq!(history[0].reason, reasons::FAILURE_THRESHOLD_REACHED);
    assert_eq!(history[0].metadata["failure_count"], 3);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_half_open_calls_are_bounded() {
    let config = CircuitBreakerConfig {
        half_open_max_calls: 3,
        success_threshold: 3,
        ..scenario_a_config()
    };
    let breaker = Arc::new(CircuitBreaker::new(config));
    breaker.force_open("test");
    tokio::time::advance(Duration::from_millis(1_000)).await;

    let gate = Arc::new(Semaphore::new(0));
    let invoked = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let breaker = Arc::clone(&breaker);
            let gate = Arc::clone(&gate);
            let invoked = Arc::clone(&invoked);
            tokio::spawn(async move {
                breaker
                    .execute(|| async move {
                        invoked.fetch_add(1, Ordering::SeqCst);
                        gate.acquire().await.map(|permit| permit.forget()).map_err(|e| e.to_string())
                    })
                    .await
            })
        })
        .collect();

    while invoked.load(Ordering::SeqCst) < 3 {
        tokio::task::yield_now().await;
    }
    assert_eq!(breaker.state(), CircuitState::HalfOpen);

    let extra_invoked = AtomicUsize::new(0);
    let extra = breaker
        .execute(|| async {
            extra_invoked.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(())
        })
        .await;
    assert!(matches!(
        extra,
        Err(CircuitBreakerError::Rejected(AdmissionError::HalfOpenLimit { max_calls: 3, .. }))
    ));
    assert_eq!(extra_invoked.load(Ordering::SeqCst), 0);

    gate.add_permits(3);
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.metrics().half_open_call_count, 0);
}

#[tokio::test]
async fn test_threshold_breach_opens_exactly_once() {
    let publisher = EventPublisher::new(64);
    let mut rx = publisher.subscribe();
    let breaker = CircuitBreaker::new(scenario_a_config()).with_publisher(publisher);

    for _ in 0..3 {
        let _ = breaker.execute(|| async { Err::<(), _>("io") }).await;
    }
    // Further calls are rejected and must not produce more transitions
    for _ in 0..5 {
        let _ = breaker.execute(|| async { Err::<(), _>("io") }).await;
    }

    let mut opened = 0;
    while let Ok(event) = rx.try_recv() {
        if let ResilienceEvent::StateTransition(event) = event {
            if event.transition.to == CircuitState::Open {
                opened += 1;
            }
        }
    }
    assert_eq!(opened, 1);
    assert_eq!(breaker.metrics().total_request_count, 3);
}

#[tokio::test]
async fn test_successes_do_not_reset_failure_count_while_closed() {
    let breaker = CircuitBreaker::new(scenario_a_config());

    for _ in 0..2 {
        let _ = breaker.execute(|| async { Err::<(), _>("io") }).await;
        breaker.execute(|| async { Ok::<_, &str>(()) }).await.unwrap();
    }
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.metrics().failure_count, 2);

    let _ = breaker.execute(|| async { Err::<(), _>("io") }).await;
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[tokio::test]
async fn test_history_is_bounded_oldest_first() {
    let config = CircuitBreakerConfig {
        max_history_size: 10,
        ..scenario_a_config()
    };
    let breaker = CircuitBreaker::new(config);

    for i in 0..30 {
        if i % 2 == 0 {
            breaker.force_open(&format!("open {i}"));
        } else {
            breaker.force_close(&format!("close {i}"));
        }
    }

    let history = breaker.state_history();
    assert_eq!(history.len(), 10);
    assert_eq!(history[0].reason, "open 20");
    assert_eq!(history[9].reason, "close 29");
}
