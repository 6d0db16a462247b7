#![allow(dead_code)] // Each test binary uses a different subset

pub mod builders;
pub mod strategies;

pub use builders::*;

/// Install a test subscriber once per binary; later calls are no-ops
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("storage_resilience=debug")
        .with_test_writer()
        .try_init();
}
