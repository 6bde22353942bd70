//! Tracing subscriber setup for the binary and integration tests.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `--log-level` nor `RUST_LOG` is set.
pub const DEFAULT_DIRECTIVE: &str = "energymap=info";

/// Installs a stderr `fmt` subscriber.
///
/// An explicit `directive` wins over `RUST_LOG`. Calling this more than once
/// is harmless; later calls leave the first subscriber in place.
pub fn init(directive: Option<&str>) {
    let filter = match directive {
        Some(d) => EnvFilter::try_new(d).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
