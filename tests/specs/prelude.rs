//! Shared helpers for spec tests

use solo_core::MemoryStore;
use std::sync::Arc;

/// Install the test log subscriber once; RUST_LOG controls verbosity.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A fresh in-memory store shared by every caller in a scenario
pub fn store() -> Arc<MemoryStore> {
    init_tracing();
    Arc::new(MemoryStore::new())
}
