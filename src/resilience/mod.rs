//! # Resilience Module
//!
//! Circuit breakers that stop calls to a failing storage backend, give it
//! time to recover and let callers fail over without waiting out a timeout.
//!
//! ## Architecture
//!
//! - **StateManager**: state, counters and bounded transition history for one breaker
//! - **CircuitBreaker**: admission control, execution and operator overrides
//! - **CircuitBreakerManager**: one shared breaker per dependency name
//! - **Metrics**: per-breaker snapshots and a system-wide aggregate
//!
//! ## Usage
//!
//! ```rust,no_run
//! use storage_resilience::config::CircuitBreakerConfig;
//! use storage_resilience::resilience::CircuitBreaker;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let breaker = CircuitBreaker::new(CircuitBreakerConfig::for_remote_storage("s3"));
//!
//! let bytes = breaker
//!     .execute(|| async { Ok::<_, std::io::Error>(vec![1u8, 2, 3]) })
//!     .await?;
//! # let _ = bytes;
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod manager;
pub mod metrics;
pub mod state_manager;

pub use circuit_breaker::{AdmissionError, CircuitBreaker, CircuitBreakerError};
pub use manager::CircuitBreakerManager;
pub use metrics::{CircuitBreakerMetrics, SystemCircuitBreakerMetrics};
pub use state_manager::{CircuitState, StateManager, StateTransition, StateTransitionEvent};
