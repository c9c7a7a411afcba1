//! Tracing setup for the CLI and tests.
//!
//! The level comes from `RUST_LOG` when set, otherwise from the `[logging]`
//! section of the config file, otherwise `info`. Output is compact and goes
//! to stderr so stdout stays clean for command results.

use crate::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LEVEL: &str = "info";

/// Initialize logging at the default level
pub fn init() {
    init_with_level(DEFAULT_LEVEL)
}

/// Initialize logging at the level named in the config file
pub fn init_from_config(config: &LoggingConfig) {
    init_with_level(&config.level)
}

/// Initialize logging with `default_level` unless `RUST_LOG` overrides it
pub fn init_with_level(default_level: &str) {
    let (filter, rejected) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, None),
        Err(_) => build_filter(default_level),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();

    if let Some(level) = rejected {
        tracing::warn!("Invalid log level {:?} in config, using {}", level, DEFAULT_LEVEL);
    }
}

/// Filter for `level`, falling back to the default on a bad directive.
/// Returns the rejected directive so it can be reported once a subscriber exists.
fn build_filter(level: &str) -> (EnvFilter, Option<String>) {
    match EnvFilter::try_new(level) {
        Ok(filter) if !level.trim().is_empty() => (filter, None),
        _ => (EnvFilter::new(DEFAULT_LEVEL), Some(level.to_string())),
    }
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
