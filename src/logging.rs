//! Logging setup for the provider process.
//!
//! Logs go to **stderr**: stdout carries the handshake line the host reads.
//! Filtering follows `RUST_LOG`, e.g. `RUST_LOG=folge_provider=debug`. The
//! transport debug logging enabled by `--debug` is emitted at `debug` level
//! under the `folge_provider::client` target.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize logging at `info` unless `RUST_LOG` says otherwise.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Initialize logging with a custom default level.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    tracing_subscriber::registry()
        .with(filter(default_level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .init();
}

/// Try to initialize logging, returning false if a subscriber is already set.
pub fn try_init_logging(default_level: &str) -> bool {
    tracing_subscriber::registry()
        .with(filter(default_level))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()
        .is_ok()
}
