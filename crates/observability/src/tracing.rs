//! Tracing initialization for binaries and test harnesses.

use tracing_subscriber::EnvFilter;

/// Install the process-wide subscriber with the default `info` floor.
///
/// Filtering is overridable via `RUST_LOG`. Idempotent: later calls lose the
/// `try_init` race and become no-ops, so tests can call it unconditionally.
pub fn init() {
    init_with_default("info");
}

/// Install the subscriber with an explicit fallback filter, used when
/// `RUST_LOG` is not set.
///
/// Output is JSON lines with timestamps, ready for log shipping; targets are
/// dropped since the span fields already carry tenant and aggregate context.
pub fn init_with_default(directives: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
