use std::time::Duration;

use nowplaying_domain::NowPlayingError;
use tracing::{info, warn};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Environment switch for newline-delimited JSON log output.
pub const LOG_JSON_ENV: &str = "NOWPLAYING_LOG_JSON";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` drives the filter (`default_level` when unset). Setting
/// `NOWPLAYING_LOG_JSON=1` switches to JSON lines. Calling this twice is a
/// no-op for the second call.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json_output_requested() {
        registry.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(false).with_writer(std::io::stderr)).try_init()
    };

    if result.is_err() {
        warn!("tracing subscriber already installed");
    }
}

fn json_output_requested() -> bool {
    std::env::var(LOG_JSON_ENV)
        .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Log the outcome of a CLI command with structured fields.
///
/// `command` must be a stable identifier; never pass tokens or codes here.
#[inline]
pub fn log_command_execution(
    command: &str,
    elapsed: Duration,
    error: Option<&NowPlayingError>,
) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error {
        None => info!(command, duration_ms, "command_execution_success"),
        Some(err) => {
            warn!(command, duration_ms, error_type = err.label(), "command_execution_failure");
        }
    }
}
