use tracing_subscriber::EnvFilter;

/// Installs the process logger at startup. Defaults to `info` so render-time
/// warnings are visible while per-symbol exclusions stay at debug; `RUST_LOG`
/// overrides the filter as usual.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
