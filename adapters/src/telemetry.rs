//! Tracing subscriber setup for binaries embedding the gateway

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` drives filtering, defaulting to `info`. Returns `false` when a
/// subscriber was already installed (tests, embedding services).
pub fn init_tracing(json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_line_number(true);

    if json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}
