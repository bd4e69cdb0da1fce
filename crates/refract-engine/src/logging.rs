//! Tracing setup for hosts embedding the engine.
//!
//! The engine only emits `tracing` events; installing a subscriber is up to
//! the host. [`init_tracing`] is a convenience for binaries and tests:
//!
//! ```bash
//! REFRACT_LOG=debug my-host
//! REFRACT_LOG="refract_engine::dispatch=trace" my-host
//! ```
//!
//! Nothing is installed unless `REFRACT_LOG` (or `RUST_LOG`) is set.

use tracing_subscriber::EnvFilter;

/// Environment variable read before `RUST_LOG`
pub const LOG_ENV: &str = "REFRACT_LOG";

/// Build an `EnvFilter` from `REFRACT_LOG`, falling back to `RUST_LOG`.
fn build_filter() -> Option<EnvFilter> {
    if let Ok(val) = std::env::var(LOG_ENV) {
        Some(EnvFilter::builder().parse_lossy(val))
    } else if std::env::var("RUST_LOG").is_ok() {
        Some(EnvFilter::from_default_env())
    } else {
        None
    }
}

/// Initialise the global tracing subscriber, writing to stderr.
///
/// Returns `false` when logging was not requested or a global subscriber is
/// already installed.
pub fn init_tracing() -> bool {
    let Some(filter) = build_filter() else {
        return false;
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
