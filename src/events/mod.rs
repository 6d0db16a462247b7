//! # Resilience Events
//!
//! Breaker state transitions, strategy health changes and factory status
//! snapshots are published on a broadcast channel. Observability sinks
//! subscribe; publishing never blocks and never fails for lack of listeners.

pub mod publisher;
pub mod types;

pub use publisher::EventPublisher;
pub use types::{ResilienceEvent, StrategyHealthChange};
