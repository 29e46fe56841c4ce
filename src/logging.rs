//! Logging setup for addonup.
//!
//! Per-add-on progress lines go to stderr through tracing, so the status
//! summary on stdout stays clean for piping. `RUST_LOG` overrides the
//! configured level.

use std::io;

use tracing_subscriber::EnvFilter;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Parses a log level from a user-supplied string.
#[must_use]
pub fn parse_level(value: &str) -> String {
    match value.to_lowercase().as_str() {
        "trace" => "trace".to_string(),
        "debug" => "debug".to_string(),
        "info" => "info".to_string(),
        "warn" | "warning" => "warn".to_string(),
        "error" => "error".to_string(),
        "off" | "none" | "disabled" => "off".to_string(),
        _ => DEFAULT_LOG_LEVEL.to_string(),
    }
}

/// Initializes the tracing subscriber. Call once at startup.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
