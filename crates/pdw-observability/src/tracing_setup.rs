//! `tracing` + `tracing-subscriber` wiring.
//! One call sets up an env-filterable, JSON-capable subscriber for the whole
//! process; every other crate just calls `tracing::{debug,info,warn}!`.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Installs the process-wide subscriber. `RUST_LOG` (or `default_directive`
/// if unset) controls verbosity. Safe to call once at process start; a
/// second call is a no-op rather than a panic, since tests commonly run in
/// the same process and may each want logging enabled.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// JSON-formatted variant, for deployments that ship logs to a collector
/// rather than a terminal.
pub fn init_tracing_json(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .json()
        .try_init();
}
