//! Test-only tracing scaffolding.
//!
//! The core never installs a subscriber itself — that's the embedding
//! application's call. This helper just gives the integration tests
//! somewhere to route `tracing` events during a run, the same way the
//! rest of this codebase's tests observe transport behavior.

#[cfg(test)]
pub fn init_test_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}