//! Opt-in log output for hosts chasing persistence timing.
//!
//! With the `profile` feature, `SaveFile` also emits per-save timings.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber honouring `RUST_LOG` (default `tasklist=debug`).
/// Does nothing if a global subscriber is already set.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tasklist=debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
