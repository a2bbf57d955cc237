//! Tracing subscriber setup for binaries.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global tracing subscriber.
///
/// Filtering comes from `RUST_LOG`, e.g. `RUST_LOG=debug` or
/// `RUST_LOG=info,impostor_room=debug`; the default is `info`. Calling
/// this a second time does nothing.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(true);

    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
}
