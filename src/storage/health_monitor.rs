//! # Strategy Health Monitor
//!
//! Background task that probes every registered strategy on a fixed interval
//! and refreshes the factory's health cache. Probes within a round run
//! concurrently up to a limit, each under its own timeout, and the round
//! waits for all of them to settle. A probe that errors, times out or panics
//! becomes an `Unhealthy` record; nothing escapes the poller.

use super::factory::StrategyRegistry;
use super::strategy::{HealthRecord, StorageStrategy};
use crate::config::StorageFactoryConfig;
use crate::events::{EventPublisher, ResilienceEvent, StrategyHealthChange};
use crate::storage::HealthStatus;
use futures::{stream, FutureExt, StreamExt};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Handle to a running poller
#[derive(Debug)]
pub(crate) struct HealthMonitor {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl HealthMonitor {
    /// Spawn the poller. The first round runs immediately.
    pub(crate) fn spawn(
        registry: Arc<StrategyRegistry>,
        config: StorageFactoryConfig,
        publisher: Option<EventPublisher>,
    ) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        info!(
            interval_ms = config.health_check_interval_ms(),
            probe_timeout_ms = config.health_probe_timeout_ms(),
            max_concurrent_probes = config.max_concurrent_probes,
            "Starting storage health monitoring"
        );

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.health_check_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = interval.tick() => {
                        tokio::select! {
                            biased;
                            _ = stop_rx.changed() => break,
                            _ = run_health_round(&registry, &config, publisher.as_ref()) => {}
                        }
                    }
                }
            }

            info!("Storage health monitoring stopped");
        });

        Self { stop_tx, handle }
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal the task to stop; an in-flight round is abandoned
    pub(crate) fn stop(self) {
        if self.stop_tx.send(true).is_err() {
            // Receiver gone means the task already exited
            debug!(finished = self.handle.is_finished(), "Health monitor already stopped");
        }
    }
}

/// Probe every registered strategy once and update the cache
pub(crate) async fn run_health_round(
    registry: &StrategyRegistry,
    config: &StorageFactoryConfig,
    publisher: Option<&EventPublisher>,
) {
    let strategies = registry.snapshot();
    if strategies.is_empty() {
        return;
    }

    let probe_timeout = config.health_probe_timeout;
    let results: Vec<(String, HealthRecord)> = stream::iter(strategies.into_iter().map(|handle| {
        let id = handle.id().to_string();
        let strategy = handle.strategy();
        async move {
            let record = probe(&id, strategy.as_ref(), probe_timeout).await;
            (id, record)
        }
    }))
    .buffer_unordered(config.max_concurrent_probes.max(1))
    .collect()
    .await;

    debug!(probed = results.len(), "Health round complete");

    for (id, record) in results {
        if let Some(change) = registry.record_health(&id, record) {
            log_health_change(&change);
            if let Some(publisher) = publisher {
                publisher.publish(ResilienceEvent::StrategyHealthChanged(change));
            }
        }
    }

    if let Some(publisher) = publisher {
        let mut status = registry.status(config.health_check_interval_ms());
        status.primary_strategy_name = registry.primary().map(|s| s.config().name.clone());
        publisher.publish(ResilienceEvent::FactoryStatus(status));
    }
}

async fn probe(id: &str, strategy: &dyn StorageStrategy, timeout: Duration) -> HealthRecord {
    let started = Instant::now();
    let outcome = tokio::time::timeout(timeout, AssertUnwindSafe(strategy.get_health()).catch_unwind()).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(Ok(record))) => record,
        Ok(Ok(Err(error))) => {
            debug!(strategy_id = %id, error = %error, "Health probe returned an error");
            HealthRecord::unhealthy(error.to_string(), elapsed_ms)
        }
        Ok(Err(_panic)) => {
            warn!(strategy_id = %id, "Health probe panicked");
            HealthRecord::unhealthy("health probe panicked", elapsed_ms)
        }
        Err(_) => HealthRecord::unhealthy(
            format!("health probe timed out after {}ms", timeout.as_millis()),
            elapsed_ms,
        ),
    }
}

fn log_health_change(change: &StrategyHealthChange) {
    let previous = change
        .previous_status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    match change.new_status {
        HealthStatus::Unhealthy => warn!(
            strategy_id = %change.strategy_id,
            previous_status = %previous,
            new_status = %change.new_status,
            error = change.error.as_deref().unwrap_or(""),
            "Storage strategy became unhealthy"
        ),
        HealthStatus::Healthy | HealthStatus::Degraded => info!(
            strategy_id = %change.strategy_id,
            previous_status = %previous,
            new_status = %change.new_status,
            "Storage strategy health changed"
        ),
    }
}
