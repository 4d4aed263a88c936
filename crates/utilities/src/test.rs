use tracing_subscriber::EnvFilter;

/// Route `tracing` events to the test output, filtered by `RUST_LOG` (default `debug`). Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}
